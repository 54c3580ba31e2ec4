//! The signature engine: signing outbound envelopes and verifying inbound
//! notifications.
//!
//! The MAC is taken over the serialized JSON bytes recovered by
//! Base64-decoding the envelope, not over the Base64 text itself. Signing and
//! verification apply the same decode-before-MAC step, and the golden test in
//! this module pins the resulting bytes; keep both paths in lockstep.

use base64::Engine;
use error_stack::ResultExt;
use masking::{PeekInterface, Secret};

use crate::{
    codec, consts,
    crypto::{self, HmacSha256, SignMessage},
    errors::{CustomResult, SignatureError},
    types::{GatewayConfig, MerchantParameters, NotificationOutcome, SignedEnvelope},
};

/// Signs one transaction's merchant parameters under the configured merchant
/// key, producing the complete transport envelope.
///
/// Config-derived fields (merchant code, terminal, merchant name, pay
/// methods, redirect URLs) are merged into the parameter set wherever the
/// caller has not already set them. The function is deterministic: identical
/// logical input always yields a byte-identical envelope.
pub fn sign(
    params: &MerchantParameters,
    config: &GatewayConfig,
) -> CustomResult<SignedEnvelope, SignatureError> {
    let merged = merge_config_fields(params.clone(), config);
    let envelope = codec::encode(&merged)?;
    let signature = compute_signature(&envelope, &merged.ds_merchant_order, config)?;
    tracing::debug!(order = %merged.ds_merchant_order, "signed merchant parameters envelope");
    Ok(SignedEnvelope::new(
        consts::SIGNATURE_VERSION.to_string(),
        Secret::new(envelope),
        Secret::new(signature),
    ))
}

/// Verifies an inbound gateway notification.
///
/// Structural defects (envelope that is not Base64/JSON, no order identifier)
/// are error results; a signature mismatch is the expected business outcome
/// `is_valid: false` and never an error.
pub fn verify(
    envelope: &SignedEnvelope,
    config: &GatewayConfig,
) -> CustomResult<NotificationOutcome, SignatureError> {
    let parameters = codec::decode(envelope.merchant_parameters())?;
    let order_id = codec::order_id(&parameters)?;
    let expected = compute_signature(envelope.merchant_parameters(), &order_id, config)?;
    let is_valid = normalize_base64(&expected) == normalize_base64(envelope.signature());
    if !is_valid {
        tracing::debug!(order = %order_id, "notification signature mismatch");
    }
    Ok(NotificationOutcome {
        is_valid,
        parameters,
    })
}

/// Derives the per-order key and MACs the envelope's underlying JSON bytes.
fn compute_signature(
    envelope_b64: &str,
    order_id: &str,
    config: &GatewayConfig,
) -> CustomResult<String, SignatureError> {
    let derived_key = crypto::derive_order_key(config.key.peek(), order_id)
        .change_context(SignatureError::SigningFailed)?;
    // MAC input is the serialized JSON recovered from the envelope, not the
    // Base64 text of the envelope itself.
    let raw_parameters = consts::BASE64_ENGINE
        .decode(envelope_b64)
        .change_context(SignatureError::MalformedEnvelope)?;
    let digest = HmacSha256
        .sign_message(&derived_key, &raw_parameters)
        .change_context(SignatureError::SigningFailed)?;
    Ok(consts::BASE64_ENGINE.encode(digest))
}

fn merge_config_fields(
    mut params: MerchantParameters,
    config: &GatewayConfig,
) -> MerchantParameters {
    params.ds_merchant_merchantcode = params
        .ds_merchant_merchantcode
        .or_else(|| Some(config.merchant_code.clone()));
    params.ds_merchant_terminal = params
        .ds_merchant_terminal
        .or_else(|| Some(config.terminal.clone()));
    params.ds_merchant_merchantname = params
        .ds_merchant_merchantname
        .or_else(|| config.merchant_name.clone());
    params.ds_merchant_paymethods = params
        .ds_merchant_paymethods
        .or_else(|| config.pay_methods.clone());
    params.ds_merchant_merchanturl = params
        .ds_merchant_merchanturl
        .or_else(|| config.notify_url.clone());
    params.ds_merchant_urlok = params.ds_merchant_urlok.or_else(|| config.success_url.clone());
    params.ds_merchant_urlko = params.ds_merchant_urlko.or_else(|| config.failure_url.clone());
    params
}

/// Normalizes a Base64 signature for comparison: whitespace stripped, the
/// URL-safe alphabet mapped back to the standard one, `=` padding restored.
/// The gateway occasionally delivers signatures in the URL-safe, unpadded
/// form.
fn normalize_base64(input: &str) -> String {
    let mut normalized: String = input
        .chars()
        .filter(|character| !character.is_whitespace())
        .map(|character| match character {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    normalized
}

#[cfg(test)]
mod signature_tests {
    #![allow(clippy::expect_used)]
    use masking::Secret;

    use super::{normalize_base64, sign, verify};
    use crate::types::{Environment, GatewayConfig, MerchantParameters, TransactionType};

    const TEST_SECRET_B64: &str = "sq7HjrUOBfKmC576ILgskD5srU870gJ7";

    const GOLDEN_ENVELOPE: &str = "eyJEU19NRVJDSEFOVF9BTU9VTlQiOiIxMC4wMCIsIkRTX01FUkNIQU5UX0NVUlJFTkNZIjoiOTc4IiwiRFNfTUVSQ0hBTlRfTUVSQ0hBTlRDT0RFIjoiOTk5MDA4ODgxIiwiRFNfTUVSQ0hBTlRfTUVSQ0hBTlRVUkwiOiJodHRwczovL3Nob3AuZXhhbXBsZS5jb20vcmVkc3lzL25vdGlmeSIsIkRTX01FUkNIQU5UX09SREVSIjoiT1JEMDAwMTIzNDU2NyIsIkRTX01FUkNIQU5UX1RFUk1JTkFMIjoiMDAxIiwiRFNfTUVSQ0hBTlRfVFJBTlNBQ1RJT05UWVBFIjoiMCIsIkRTX01FUkNIQU5UX1VSTEtPIjoiaHR0cHM6Ly9zaG9wLmV4YW1wbGUuY29tL3JlZHN5cy9rbyIsIkRTX01FUkNIQU5UX1VSTE9LIjoiaHR0cHM6Ly9zaG9wLmV4YW1wbGUuY29tL3JlZHN5cy9vayJ9";

    const GOLDEN_SIGNATURE: &str = "9U3+ONFeNk1F9PgImOG7LXxDs51KenAhMoK+LL2kzLk=";

    fn test_config() -> GatewayConfig {
        GatewayConfig::new(
            "999008881".to_string(),
            "001".to_string(),
            Secret::new(TEST_SECRET_B64.to_string()),
            Environment::Test,
        )
        .expect("Test configuration")
        .with_urls(
            Some("https://shop.example.com/redsys/notify".to_string()),
            Some("https://shop.example.com/redsys/ok".to_string()),
            Some("https://shop.example.com/redsys/ko".to_string()),
        )
    }

    fn golden_params() -> MerchantParameters {
        MerchantParameters::new("10.00", "ORD0001234567", "978", TransactionType::Payment)
    }

    #[test]
    fn test_sign_matches_golden_values() {
        let envelope = sign(&golden_params(), &test_config()).expect("Signed envelope");

        assert_eq!(envelope.signature_version(), "HMAC_SHA256_V1");
        assert_eq!(envelope.merchant_parameters(), GOLDEN_ENVELOPE);
        assert_eq!(envelope.signature(), GOLDEN_SIGNATURE);
    }

    #[test]
    fn test_sign_is_deterministic() {
        let config = test_config();
        let first = sign(&golden_params(), &config).expect("First signing");
        let second = sign(&golden_params(), &config).expect("Second signing");

        assert_eq!(first.merchant_parameters(), second.merchant_parameters());
        assert_eq!(first.signature(), second.signature());
    }

    #[test]
    fn test_verify_accepts_own_signature() {
        let config = test_config();
        let envelope = sign(&golden_params(), &config).expect("Signed envelope");

        let outcome = verify(&envelope, &config).expect("Verification outcome");
        assert!(outcome.is_valid);
        assert_eq!(
            outcome.parameters["DS_MERCHANT_ORDER"],
            serde_json::json!("ORD0001234567")
        );
    }

    #[test]
    fn test_verify_accepts_urlsafe_unpadded_signature() {
        use crate::types::SignedEnvelope;

        let config = test_config();
        let urlsafe = GOLDEN_SIGNATURE
            .replace('+', "-")
            .replace('/', "_")
            .trim_end_matches('=')
            .to_string();
        let envelope =
            SignedEnvelope::from_parts("HMAC_SHA256_V1", GOLDEN_ENVELOPE.to_string(), urlsafe);

        let outcome = verify(&envelope, &config).expect("Verification outcome");
        assert!(outcome.is_valid);
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        use crate::types::SignedEnvelope;

        let config = test_config();
        // flip the final digest byte
        let tampered = format!("{}ZLk=", &GOLDEN_SIGNATURE[..GOLDEN_SIGNATURE.len() - 4]);
        let envelope =
            SignedEnvelope::from_parts("HMAC_SHA256_V1", GOLDEN_ENVELOPE.to_string(), tampered);

        let outcome = verify(&envelope, &config).expect("Verification outcome");
        assert!(!outcome.is_valid);
    }

    #[test]
    fn test_verify_rejects_tampered_parameters() {
        use crate::types::SignedEnvelope;

        let config = test_config();
        let signed = sign(&golden_params(), &config).expect("Signed envelope");

        // re-encode the envelope with a different amount but keep the signature
        let mut parameters: serde_json::Value =
            crate::codec::decode(signed.merchant_parameters()).expect("Decoded parameters");
        parameters["DS_MERCHANT_AMOUNT"] = serde_json::json!("99999.00");
        let tampered_envelope = crate::codec::encode(&parameters).expect("Re-encoded parameters");

        let envelope = SignedEnvelope::from_parts(
            "HMAC_SHA256_V1",
            tampered_envelope,
            signed.signature().to_string(),
        );
        let outcome = verify(&envelope, &config).expect("Verification outcome");
        assert!(!outcome.is_valid);
    }

    #[test]
    fn test_signature_is_order_bound() {
        use crate::types::SignedEnvelope;

        let config = test_config();
        let signed = sign(&golden_params(), &config).expect("Signed envelope");

        // swap the embedded order id without re-signing; the recomputed key
        // no longer matches the one the signature was produced under
        let mut parameters: serde_json::Value =
            crate::codec::decode(signed.merchant_parameters()).expect("Decoded parameters");
        parameters["DS_MERCHANT_ORDER"] = serde_json::json!("ORD0007654321");
        let swapped_envelope = crate::codec::encode(&parameters).expect("Re-encoded parameters");

        let envelope = SignedEnvelope::from_parts(
            "HMAC_SHA256_V1",
            swapped_envelope,
            signed.signature().to_string(),
        );
        let outcome = verify(&envelope, &config).expect("Verification outcome");
        assert!(!outcome.is_valid);
    }

    #[test]
    fn test_verify_errors_on_malformed_envelope() {
        use crate::types::SignedEnvelope;

        let config = test_config();
        let envelope = SignedEnvelope::from_parts(
            "HMAC_SHA256_V1",
            "!!!not-base64!!!".to_string(),
            GOLDEN_SIGNATURE.to_string(),
        );
        assert!(verify(&envelope, &config).is_err());
    }

    #[test]
    fn test_verify_errors_on_missing_order_id() {
        use crate::types::SignedEnvelope;

        let config = test_config();
        let parameters = serde_json::json!({"Ds_Amount": "1000"});
        let envelope_b64 = crate::codec::encode(&parameters).expect("Encoded parameters");
        let envelope = SignedEnvelope::from_parts(
            "HMAC_SHA256_V1",
            envelope_b64,
            GOLDEN_SIGNATURE.to_string(),
        );
        assert!(verify(&envelope, &config).is_err());
    }

    #[test]
    fn test_explicit_urls_override_config_defaults() {
        let config = test_config();
        let params = golden_params().with_urls(
            "https://other.example.com/notify",
            "https://other.example.com/ok",
            "https://other.example.com/ko",
        );

        let envelope = sign(&params, &config).expect("Signed envelope");
        let decoded =
            crate::codec::decode(envelope.merchant_parameters()).expect("Decoded parameters");
        assert_eq!(
            decoded["DS_MERCHANT_MERCHANTURL"],
            serde_json::json!("https://other.example.com/notify")
        );
    }

    #[test]
    fn test_normalize_base64() {
        assert_eq!(
            normalize_base64("9U3-ONFeNk1F9PgImOG7LXxDs51KenAhMoK-LL2kzLk"),
            GOLDEN_SIGNATURE
        );
        assert_eq!(
            normalize_base64(" 9U3+ONFeNk1F9PgImOG7\nLXxDs51KenAhMoK+LL2kzLk= "),
            GOLDEN_SIGNATURE
        );
        assert_eq!(normalize_base64("abcd"), "abcd");
    }
}
