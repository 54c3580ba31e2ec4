//! Cryptographic primitives behind the signature engine.
//!
//! The gateway protocol uses 3DES-CBC purely as a key-derivation step: the
//! UTF-8 order identifier is encrypted under the merchant key and the
//! ciphertext becomes the HMAC key for that transaction. This ties every
//! signature to its order, so a captured signature cannot authenticate a
//! different order's parameters.

use error_stack::ResultExt;
use openssl::symm::{encrypt, Cipher};
use ring::hmac;

use crate::{
    consts,
    errors::{CryptoError, CustomResult},
};

/// Trait for cryptographically signing messages
pub trait SignMessage {
    /// Takes in a secret and a message and returns the calculated signature as bytes
    fn sign_message(&self, secret: &[u8], msg: &[u8]) -> CustomResult<Vec<u8>, CryptoError>;
}

/// Represents the HMAC-SHA-256 algorithm
#[derive(Debug)]
pub struct HmacSha256;

impl SignMessage for HmacSha256 {
    fn sign_message(&self, secret: &[u8], msg: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
        Ok(hmac::sign(&key, msg).as_ref().to_vec())
    }
}

/// Triple DES (EDE3) in CBC mode with an all-zero IV and PKCS#7 padding.
#[derive(Debug)]
pub struct TripleDesEde3Cbc;

impl TripleDesEde3Cbc {
    const IV_LENGTH: usize = 8;

    /// Encrypts `msg` under a 24-byte key, returning the full padded
    /// ciphertext (always a multiple of 8 bytes).
    pub fn encrypt(&self, key: &[u8], msg: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        if key.len() != consts::MERCHANT_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength.into());
        }
        let iv = [0u8; Self::IV_LENGTH];
        encrypt(Cipher::des_ede3_cbc(), key, Some(&iv), msg)
            .change_context(CryptoError::KeyDerivationFailed)
            .attach_printable("Triple DES encryption failed")
    }
}

/// Derives the per-order HMAC key from the merchant key and the order id.
pub fn derive_order_key(secret: &[u8], order_id: &str) -> CustomResult<Vec<u8>, CryptoError> {
    TripleDesEde3Cbc.encrypt(secret, order_id.as_bytes())
}
