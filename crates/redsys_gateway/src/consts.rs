//! Crate-wide constants.

use base64::engine::general_purpose;

/// Base64 engine used on every wire field: standard alphabet, `=` padding.
pub const BASE64_ENGINE: general_purpose::GeneralPurpose = general_purpose::STANDARD;

/// Value of the `Ds_SignatureVersion` transport field.
pub const SIGNATURE_VERSION: &str = "HMAC_SHA256_V1";

/// Submission endpoint of the Redsys integration (test) environment.
pub const TEST_ENDPOINT: &str = "https://sis-t.redsys.es:25443/sis/realizarPago";

/// Submission endpoint of the Redsys production environment.
pub const LIVE_ENDPOINT: &str = "https://sis.redsys.es/sis/realizarPago";

/// Length in bytes of a Base64-decoded merchant key (3DES-EDE3 keying material).
pub const MERCHANT_KEY_LENGTH: usize = 24;

/// Maximum length the gateway accepts for `DS_MERCHANT_MERCHANTNAME`.
pub const MERCHANT_NAME_MAX_LENGTH: usize = 60;

/// Maximum number of digits in a terminal identifier.
pub const TERMINAL_MAX_DIGITS: usize = 3;
