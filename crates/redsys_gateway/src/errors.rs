//! Errors and error specific types for the signing engine.

/// Custom Result
/// A custom datatype that wraps the error variant <E> into a report, allowing
/// error_stack::Report<E> specific extendability
///
/// Effectively, equivalent to `Result<T, error_stack::Report<E>>`
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Gateway configuration errors, detected once when the [`crate::types::GatewayConfig`]
/// value is constructed. A config that fails here never reaches a cryptographic call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The merchant secret is not valid Base64 or does not decode to exactly 24 bytes
    #[error("Merchant secret must be Base64 decoding to exactly 24 bytes")]
    InvalidSecretLength,
    /// The terminal identifier is not a 1 to 3 digit number
    #[error("Terminal must be a numeric string of 1 to 3 digits")]
    InvalidTerminal,
    /// The merchant name exceeds the 60 character limit imposed by the gateway
    #[error("Merchant name must not exceed 60 characters")]
    InvalidMerchantName,
}

/// Cryptographic algorithm errors
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The supplied key material has the wrong length for the algorithm
    #[error("Invalid key length for the requested algorithm")]
    InvalidKeyLength,
    /// The per-order key could not be derived from the merchant secret
    #[error("Failed to derive the per-order key")]
    KeyDerivationFailed,
    /// The algorithm was unable to sign the message
    #[error("Failed to sign message")]
    MessageSigningFailed,
}

/// Structural errors raised by the codec and the signature engine. A signature
/// mismatch is deliberately not represented here: it is a business outcome
/// reported through [`crate::types::NotificationOutcome`], never an error.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The merchant parameters could not be serialized into the envelope
    #[error("Failed to encode merchant parameters envelope")]
    EncodingFailed,
    /// The received envelope is not valid Base64 or does not contain valid JSON
    #[error("Merchant parameters envelope is not valid Base64 or JSON")]
    MalformedEnvelope,
    /// The decoded envelope carries no recognizable order identifier field
    #[error("Decoded merchant parameters carry no order identifier")]
    MissingOrderId,
    /// A cryptographic step failed while producing or checking the signature
    #[error("Failed to compute the envelope signature")]
    SigningFailed,
}
