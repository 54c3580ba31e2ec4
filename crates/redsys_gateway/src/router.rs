//! Endpoint resolution and final submission assembly.
//!
//! No network I/O happens here: the returned field set is rendered as hidden
//! form fields by the browser-redirect collaborator and POSTed by the
//! cardholder's browser.

use crate::{
    consts,
    errors::{CustomResult, SignatureError},
    signature,
    types::{Environment, GatewayConfig, MerchantParameters, SignedEnvelope},
};

/// Resolves the form submission URL for a gateway environment.
///
/// Unknown environment values cannot occur: the external configuration
/// loader rejects them before a [`GatewayConfig`] exists.
pub fn endpoint(environment: Environment) -> &'static str {
    match environment {
        Environment::Test => consts::TEST_ENDPOINT,
        Environment::Live => consts::LIVE_ENDPOINT,
    }
}

/// A signed envelope paired with the endpoint it must be POSTed to.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Gateway form submission URL for the configured environment.
    pub endpoint: &'static str,
    /// The three signed transport fields.
    pub fields: SignedEnvelope,
}

/// Signs the transaction and assembles everything the form-submission
/// collaborator needs.
pub fn build_submission(
    params: &MerchantParameters,
    config: &GatewayConfig,
) -> CustomResult<Submission, SignatureError> {
    let fields = signature::sign(params, config)?;
    Ok(Submission {
        endpoint: endpoint(config.environment()),
        fields,
    })
}

#[cfg(test)]
mod router_tests {
    #![allow(clippy::expect_used)]
    use masking::Secret;

    use super::{build_submission, endpoint};
    use crate::types::{Environment, GatewayConfig, MerchantParameters, TransactionType};

    #[test]
    fn test_endpoint_lookup() {
        assert_eq!(
            endpoint(Environment::Test),
            "https://sis-t.redsys.es:25443/sis/realizarPago"
        );
        assert_eq!(
            endpoint(Environment::Live),
            "https://sis.redsys.es/sis/realizarPago"
        );
    }

    #[test]
    fn test_build_submission_yields_form_fields() {
        let config = GatewayConfig::new(
            "999008881".to_string(),
            "1".to_string(),
            Secret::new("sq7HjrUOBfKmC576ILgskD5srU870gJ7".to_string()),
            Environment::Test,
        )
        .expect("Test configuration");
        let params =
            MerchantParameters::new("1000", "ORD0001234567", "978", TransactionType::Payment);

        let submission = build_submission(&params, &config).expect("Submission");
        assert_eq!(
            submission.endpoint,
            "https://sis-t.redsys.es:25443/sis/realizarPago"
        );

        let fields = submission.fields.form_fields();
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            ["Ds_SignatureVersion", "Ds_MerchantParameters", "Ds_Signature"]
        );
        assert_eq!(fields[0].1, "HMAC_SHA256_V1");
    }
}
