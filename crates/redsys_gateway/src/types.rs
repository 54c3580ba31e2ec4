//! Value objects exchanged with the signing engine.

use base64::Engine;
use masking::{ExposeInterface, PeekInterface, Secret};
use serde::{Deserialize, Serialize};

use crate::{
    consts,
    errors::{ConfigError, CustomResult},
    sca::{CofMarker, CofType, ScaException},
};

/// Gateway environment the merchant account is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Integration environment (`sis-t`)
    Test,
    /// Production environment
    Live,
}

/// Immutable merchant configuration, constructed once at process start.
///
/// Construction eagerly Base64-decodes the merchant secret and rejects
/// anything that is not exactly 24 bytes of 3DES keying material, so no
/// signing or verification call can ever run with an unusable key.
#[derive(Clone)]
pub struct GatewayConfig {
    pub(crate) merchant_code: Secret<String>,
    pub(crate) terminal: Secret<String>,
    pub(crate) key: Secret<Vec<u8>>,
    pub(crate) environment: Environment,
    pub(crate) notify_url: Option<String>,
    pub(crate) success_url: Option<String>,
    pub(crate) failure_url: Option<String>,
    pub(crate) merchant_name: Option<String>,
    pub(crate) pay_methods: Option<String>,
}

impl GatewayConfig {
    /// Validates and builds a gateway configuration.
    ///
    /// `secret` is the Base64-encoded merchant key as issued by the acquiring
    /// bank; `terminal` is the 1 to 3 digit terminal number.
    pub fn new(
        merchant_code: String,
        terminal: String,
        secret: Secret<String>,
        environment: Environment,
    ) -> CustomResult<Self, ConfigError> {
        if terminal.is_empty()
            || terminal.len() > consts::TERMINAL_MAX_DIGITS
            || !terminal.bytes().all(|byte| byte.is_ascii_digit())
        {
            return Err(ConfigError::InvalidTerminal.into());
        }
        let key = consts::BASE64_ENGINE
            .decode(secret.peek())
            .map_err(|_| ConfigError::InvalidSecretLength)?;
        if key.len() != consts::MERCHANT_KEY_LENGTH {
            return Err(ConfigError::InvalidSecretLength.into());
        }
        Ok(Self {
            merchant_code: Secret::new(merchant_code),
            terminal: Secret::new(terminal),
            key: Secret::new(key),
            environment,
            notify_url: None,
            success_url: None,
            failure_url: None,
            merchant_name: None,
            pay_methods: None,
        })
    }

    /// Sets the default notification, success and failure redirect URLs
    /// merged into any transaction that does not carry its own.
    pub fn with_urls(
        mut self,
        notify_url: Option<String>,
        success_url: Option<String>,
        failure_url: Option<String>,
    ) -> Self {
        self.notify_url = notify_url;
        self.success_url = success_url;
        self.failure_url = failure_url;
        self
    }

    /// Sets the merchant name shown on the gateway's hosted payment page.
    pub fn with_merchant_name(mut self, merchant_name: String) -> CustomResult<Self, ConfigError> {
        if merchant_name.chars().count() > consts::MERCHANT_NAME_MAX_LENGTH {
            return Err(ConfigError::InvalidMerchantName.into());
        }
        self.merchant_name = Some(merchant_name);
        Ok(self)
    }

    /// Restricts the payment methods offered on the hosted payment page.
    pub fn with_pay_methods(mut self, pay_methods: String) -> Self {
        self.pay_methods = Some(pay_methods);
        self
    }

    /// Environment this configuration targets.
    pub fn environment(&self) -> Environment {
        self.environment
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("merchant_code", &self.merchant_code)
            .field("terminal", &self.terminal)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

/// Transaction types accepted by the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum TransactionType {
    /// Standard payment (auto capture)
    #[serde(rename = "0")]
    Payment,
    /// Preauthorization (manual capture required)
    #[serde(rename = "1")]
    Preauthorization,
    /// Confirmation of preauthorization (capture)
    #[serde(rename = "2")]
    Confirmation,
    /// Refund
    #[serde(rename = "3")]
    Refund,
    /// Cancellation (void)
    #[serde(rename = "9")]
    Cancellation,
}

/// One transaction's worth of merchant parameters.
///
/// Only the amount, order, currency and transaction type are mandatory.
/// Merchant code, terminal, merchant name, pay methods and the redirect URLs
/// are normally left `None` and filled in from [`GatewayConfig`] when the
/// envelope is signed. Absent fields are never serialized, and the codec
/// orders the remaining keys lexicographically, so the serialized form is
/// byte-deterministic.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MerchantParameters {
    /// Amount in the gateway's expected string format.
    pub ds_merchant_amount: String,
    /// Whether this is the last transaction of the stored-credential series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_cof_fin: Option<CofMarker>,
    /// Whether this is the first transaction of the stored-credential series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_cof_ini: Option<CofMarker>,
    /// Whether the series was authenticated under EMV 3DS 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_cof_tds2: Option<CofMarker>,
    /// Gateway transaction id of the initial authorization in the series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_cof_txnid: Option<String>,
    /// Kind of stored-credential relationship.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_cof_type: Option<CofType>,
    /// ISO 4217 numeric currency code (e.g. "978" for EUR).
    pub ds_merchant_currency: String,
    /// EMV3DS risk-analysis payload, pre-serialized as a JSON string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_emv3ds: Option<String>,
    /// SCA exemption claimed for this transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_excep_sca: Option<ScaException>,
    /// Merchant code; filled from config when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_merchantcode: Option<Secret<String>>,
    /// Merchant name; filled from config when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_merchantname: Option<String>,
    /// Server-to-server notification URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_merchanturl: Option<String>,
    /// Unique order identifier the per-transaction key is derived from.
    pub ds_merchant_order: String,
    /// Payment method restriction; filled from config when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_paymethods: Option<String>,
    /// Terminal number; filled from config when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_terminal: Option<Secret<String>>,
    /// Gateway transaction type code.
    pub ds_merchant_transactiontype: TransactionType,
    /// Browser redirect URL on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_urlko: Option<String>,
    /// Browser redirect URL on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_merchant_urlok: Option<String>,
}

impl MerchantParameters {
    /// Builds the mandatory core of a transaction's parameter set.
    pub fn new(
        amount: impl Into<String>,
        order: impl Into<String>,
        currency: impl Into<String>,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            ds_merchant_amount: amount.into(),
            ds_merchant_cof_fin: None,
            ds_merchant_cof_ini: None,
            ds_merchant_cof_tds2: None,
            ds_merchant_cof_txnid: None,
            ds_merchant_cof_type: None,
            ds_merchant_currency: currency.into(),
            ds_merchant_emv3ds: None,
            ds_merchant_excep_sca: None,
            ds_merchant_merchantcode: None,
            ds_merchant_merchantname: None,
            ds_merchant_merchanturl: None,
            ds_merchant_order: order.into(),
            ds_merchant_paymethods: None,
            ds_merchant_terminal: None,
            ds_merchant_transactiontype: transaction_type,
            ds_merchant_urlko: None,
            ds_merchant_urlok: None,
        }
    }

    /// Sets the notification, success and failure redirect URLs on this
    /// transaction, overriding any configured defaults.
    pub fn with_urls(
        mut self,
        notify_url: impl Into<String>,
        success_url: impl Into<String>,
        failure_url: impl Into<String>,
    ) -> Self {
        self.ds_merchant_merchanturl = Some(notify_url.into());
        self.ds_merchant_urlok = Some(success_url.into());
        self.ds_merchant_urlko = Some(failure_url.into());
        self
    }
}

/// The signed transport envelope, produced once per transaction and never
/// mutated afterwards. The asynchronous notification POSTed back by the
/// gateway carries the same three fields, so the type derives `Deserialize`
/// for the inbound path as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope {
    #[serde(rename = "Ds_SignatureVersion")]
    signature_version: String,
    #[serde(rename = "Ds_MerchantParameters")]
    merchant_parameters: Secret<String>,
    #[serde(rename = "Ds_Signature")]
    signature: Secret<String>,
}

impl SignedEnvelope {
    pub(crate) fn new(
        signature_version: String,
        merchant_parameters: Secret<String>,
        signature: Secret<String>,
    ) -> Self {
        Self {
            signature_version,
            merchant_parameters,
            signature,
        }
    }

    /// Rebuilds an envelope from the raw notification triple handed over by
    /// the HTTP route.
    pub fn from_parts(
        signature_version: impl Into<String>,
        merchant_parameters: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            signature_version: signature_version.into(),
            merchant_parameters: Secret::new(merchant_parameters.into()),
            signature: Secret::new(signature.into()),
        }
    }

    /// Signature scheme tag (`HMAC_SHA256_V1`).
    pub fn signature_version(&self) -> &str {
        &self.signature_version
    }

    /// Base64 merchant parameter envelope.
    pub fn merchant_parameters(&self) -> &str {
        self.merchant_parameters.peek()
    }

    /// Base64 signature over the envelope.
    pub fn signature(&self) -> &str {
        self.signature.peek()
    }

    /// The hidden form fields the browser-redirect collaborator renders.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Ds_SignatureVersion", self.signature_version.clone()),
            (
                "Ds_MerchantParameters",
                self.merchant_parameters.clone().expose(),
            ),
            ("Ds_Signature", self.signature.clone().expose()),
        ]
    }
}

/// Outcome of verifying an inbound notification.
///
/// A signature mismatch is an expected business outcome (`is_valid: false`),
/// not an error; only structurally malformed envelopes produce error results.
#[derive(Debug, Clone)]
pub struct NotificationOutcome {
    /// Whether the recomputed signature matched the received one.
    pub is_valid: bool,
    /// The decoded merchant parameters, regardless of validity.
    pub parameters: serde_json::Value,
}

#[cfg(test)]
mod config_tests {
    #![allow(clippy::expect_used)]
    use base64::Engine;
    use masking::Secret;

    use super::{Environment, GatewayConfig};

    const TEST_SECRET_B64: &str = "sq7HjrUOBfKmC576ILgskD5srU870gJ7";

    fn valid_config() -> GatewayConfig {
        GatewayConfig::new(
            "999008881".to_string(),
            "001".to_string(),
            Secret::new(TEST_SECRET_B64.to_string()),
            Environment::Test,
        )
        .expect("Valid configuration")
    }

    #[test]
    fn test_accepts_24_byte_secret() {
        assert_eq!(valid_config().environment(), Environment::Test);
    }

    #[test]
    fn test_rejects_secret_of_wrong_length() {
        // 16 bytes once decoded
        let short = crate::consts::BASE64_ENGINE.encode([0u8; 16]);
        let result = GatewayConfig::new(
            "999008881".to_string(),
            "001".to_string(),
            Secret::new(short),
            Environment::Test,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_secret_that_is_not_base64() {
        let result = GatewayConfig::new(
            "999008881".to_string(),
            "001".to_string(),
            Secret::new("%%%definitely not base64%%%".to_string()),
            Environment::Test,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_terminals() {
        for terminal in ["", "1234", "1a", "-1"] {
            let result = GatewayConfig::new(
                "999008881".to_string(),
                terminal.to_string(),
                Secret::new(TEST_SECRET_B64.to_string()),
                Environment::Test,
            );
            assert!(result.is_err(), "terminal {terminal:?} must be rejected");
        }
    }

    #[test]
    fn test_rejects_overlong_merchant_name() {
        assert!(valid_config().with_merchant_name("x".repeat(61)).is_err());
        assert!(valid_config().with_merchant_name("x".repeat(60)).is_ok());
    }

    #[test]
    fn test_debug_does_not_leak_key_material() {
        let rendered = format!("{:?}", valid_config());
        assert!(!rendered.contains(TEST_SECRET_B64));
    }
}
