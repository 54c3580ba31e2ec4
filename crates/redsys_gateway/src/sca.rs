//! PSD2/SCA exemption and card-on-file metadata builders.
//!
//! These are pure data builders: they never touch the merchant key and
//! perform no cryptography. Callers merge the produced fields into a
//! [`MerchantParameters`] value before handing it to the signature engine.

use error_stack::ResultExt;
use masking::Secret;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{CustomResult, SignatureError},
    types::MerchantParameters,
};

/// SCA exemption categories the gateway recognizes. Mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScaException {
    /// Merchant-initiated transaction (e.g. a recurring subscription charge)
    Mit,
    /// Low-value exemption
    Lwv,
    /// Transaction risk analysis exemption
    Tra,
    /// Secure corporate payment exemption
    Cor,
}

/// Kind of stored-credential relationship between transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CofType {
    /// Cardholder-initiated use of a stored credential
    C,
    /// Installment series
    I,
    /// Merchant-initiated use of a stored credential
    M,
    /// Recurring series
    R,
    /// Unscheduled merchant-initiated charge
    U,
}

/// Yes / No / Not-known marker used by the COF descriptor fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CofMarker {
    /// No
    N,
    /// Not known / not applicable
    S,
    /// Yes
    Y,
}

/// A set of SCA/COF fields to be merged into a transaction's parameters.
#[derive(Debug, Clone, Default)]
pub struct ScaExtension {
    exception: Option<ScaException>,
    cof_type: Option<CofType>,
    cof_ini: Option<CofMarker>,
    cof_fin: Option<CofMarker>,
    cof_tds2: Option<CofMarker>,
    cof_txnid: Option<String>,
}

/// Marks the transaction as merchant-initiated and describes the
/// stored-credential series it belongs to. `original_txn_id` links a
/// recurring charge back to its initial authorization.
pub fn merchant_initiated(
    cof_type: CofType,
    initial: CofMarker,
    last: CofMarker,
    tds2: CofMarker,
    original_txn_id: Option<String>,
) -> ScaExtension {
    ScaExtension {
        exception: Some(ScaException::Mit),
        cof_type: Some(cof_type),
        cof_ini: Some(initial),
        cof_fin: Some(last),
        cof_tds2: Some(tds2),
        cof_txnid: original_txn_id,
    }
}

/// Claims the transaction-risk-analysis exemption.
pub fn transaction_risk_analysis() -> ScaExtension {
    ScaExtension {
        exception: Some(ScaException::Tra),
        ..ScaExtension::default()
    }
}

/// Claims the low-value exemption.
pub fn low_value_exemption() -> ScaExtension {
    ScaExtension {
        exception: Some(ScaException::Lwv),
        ..ScaExtension::default()
    }
}

/// Claims the secure-corporate-payment exemption.
pub fn secure_corporate() -> ScaExtension {
    ScaExtension {
        exception: Some(ScaException::Cor),
        ..ScaExtension::default()
    }
}

/// Attaches card-on-file descriptors without claiming any SCA exemption, for
/// transactions that go through full authentication but still belong to a
/// stored-credential series.
pub fn card_on_file(
    cof_type: CofType,
    initial: CofMarker,
    last: CofMarker,
    tds2: CofMarker,
    original_txn_id: Option<String>,
) -> ScaExtension {
    ScaExtension {
        exception: None,
        cof_type: Some(cof_type),
        cof_ini: Some(initial),
        cof_fin: Some(last),
        cof_tds2: Some(tds2),
        cof_txnid: original_txn_id,
    }
}

impl MerchantParameters {
    /// Merges an SCA/COF extension into this parameter set. Only the fields
    /// the extension carries are written, so extensions compose: attaching
    /// [`card_on_file`] after an exemption keeps the exemption marker, and
    /// vice versa. A later extension wins where both carry the same field.
    pub fn with_sca(mut self, extension: ScaExtension) -> Self {
        if let Some(exception) = extension.exception {
            self.ds_merchant_excep_sca = Some(exception);
        }
        if let Some(cof_type) = extension.cof_type {
            self.ds_merchant_cof_type = Some(cof_type);
        }
        if let Some(cof_ini) = extension.cof_ini {
            self.ds_merchant_cof_ini = Some(cof_ini);
        }
        if let Some(cof_fin) = extension.cof_fin {
            self.ds_merchant_cof_fin = Some(cof_fin);
        }
        if let Some(cof_tds2) = extension.cof_tds2 {
            self.ds_merchant_cof_tds2 = Some(cof_tds2);
        }
        if let Some(cof_txnid) = extension.cof_txnid {
            self.ds_merchant_cof_txnid = Some(cof_txnid);
        }
        self
    }

    /// Serializes an EMV3DS payload and attaches it as the
    /// `DS_MERCHANT_EMV3DS` JSON-string field, for transactions submitted to
    /// full 3-D Secure risk analysis instead of claiming an exemption.
    pub fn with_emv3ds(mut self, data: &Emv3DsData) -> CustomResult<Self, SignatureError> {
        self.ds_merchant_emv3ds = Some(build_emv3ds(data)?);
        Ok(self)
    }
}

/// Serializes the EMV3DS risk-analysis payload as a single JSON string,
/// dropping any absent sub-fields.
pub fn build_emv3ds(data: &Emv3DsData) -> CustomResult<String, SignatureError> {
    serde_json::to_string(data).change_context(SignatureError::EncodingFailed)
}

/// Cardholder, address, browser and risk data forwarded to the 3DS server.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Emv3DsData {
    /// Cardholder account history (`acctInfo` block).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acct_info: Option<AccountHistory>,
    /// Billing address block, flattened into the payload.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub billing_data: Option<BillingData>,
    /// Browser fingerprint block, flattened into the payload.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub browser_data: Option<BrowserData>,
    /// Cardholder name as entered at checkout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardholder_name: Option<Secret<String>>,
    /// Cardholder email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Secret<String>>,
    /// Merchant risk indicator block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_risk_indicator: Option<MerchantRiskIndicator>,
    /// Prior authentication performed by the 3DS requestor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub three_d_s_requestor_authentication_info: Option<RequestorAuthenticationInfo>,
}

/// Billing address data for 3DS
#[allow(missing_docs)] // EMV3DS protocol field names are self-describing
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr_city: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr_line1: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr_line2: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr_line3: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr_postal_code: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr_state: Option<Secret<String>>,
}

/// Browser environment collected by the checkout page for 3DS
#[allow(missing_docs)] // EMV3DS protocol field names are self-describing
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_accept_header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_color_depth: Option<String>,
    #[serde(rename = "browserIP", skip_serializing_if = "Option::is_none")]
    pub browser_ip: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_java_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_javascript_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_screen_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_screen_width: Option<String>,
    #[serde(rename = "browserTZ", skip_serializing_if = "Option::is_none")]
    pub browser_tz: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_user_agent: Option<Secret<String>>,
}

/// Cardholder account history (`acctInfo`)
#[allow(missing_docs)] // EMV3DS protocol field names are self-describing
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHistory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch_acc_age_ind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch_acc_change_ind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch_acc_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_purchase_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspicious_acc_activity: Option<String>,
}

/// Merchant risk indicator block
#[allow(missing_docs)] // EMV3DS protocol field names are self-describing
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantRiskIndicator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_email_address: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_timeframe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_order_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_order_purchase_ind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_items_ind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship_ind: Option<String>,
}

/// Prior-authentication data supplied by the 3DS requestor
#[allow(missing_docs)] // EMV3DS protocol field names are self-describing
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestorAuthenticationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub three_d_s_req_auth_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub three_d_s_req_auth_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub three_d_s_req_auth_timestamp: Option<String>,
}

#[cfg(test)]
mod sca_tests {
    #![allow(clippy::expect_used)]
    use masking::Secret;

    use super::*;
    use crate::types::{MerchantParameters, TransactionType};

    fn base_params() -> MerchantParameters {
        MerchantParameters::new("1000", "ORD0001", "978", TransactionType::Payment)
    }

    #[test]
    fn test_merchant_initiated_sets_marker_and_cof_fields() {
        let params = base_params().with_sca(merchant_initiated(
            CofType::R,
            CofMarker::N,
            CofMarker::N,
            CofMarker::Y,
            Some("999999999999".to_string()),
        ));

        assert_eq!(params.ds_merchant_excep_sca, Some(ScaException::Mit));
        assert_eq!(params.ds_merchant_cof_type, Some(CofType::R));
        assert_eq!(params.ds_merchant_cof_ini, Some(CofMarker::N));
        assert_eq!(params.ds_merchant_cof_fin, Some(CofMarker::N));
        assert_eq!(params.ds_merchant_cof_tds2, Some(CofMarker::Y));
        assert_eq!(
            params.ds_merchant_cof_txnid.as_deref(),
            Some("999999999999")
        );
    }

    #[test]
    fn test_marker_only_exemptions() {
        for (extension, expected) in [
            (transaction_risk_analysis(), ScaException::Tra),
            (low_value_exemption(), ScaException::Lwv),
            (secure_corporate(), ScaException::Cor),
        ] {
            let params = base_params().with_sca(extension);
            assert_eq!(params.ds_merchant_excep_sca, Some(expected));
            assert_eq!(params.ds_merchant_cof_type, None);
            assert_eq!(params.ds_merchant_cof_txnid, None);
        }
    }

    #[test]
    fn test_card_on_file_leaves_exemption_unset() {
        let params = base_params().with_sca(card_on_file(
            CofType::C,
            CofMarker::S,
            CofMarker::N,
            CofMarker::S,
            None,
        ));

        assert_eq!(params.ds_merchant_excep_sca, None);
        assert_eq!(params.ds_merchant_cof_type, Some(CofType::C));
    }

    #[test]
    fn test_card_on_file_keeps_existing_exemption_marker() {
        let params = base_params()
            .with_sca(low_value_exemption())
            .with_sca(card_on_file(
                CofType::R,
                CofMarker::N,
                CofMarker::N,
                CofMarker::Y,
                None,
            ));

        assert_eq!(params.ds_merchant_excep_sca, Some(ScaException::Lwv));
        assert_eq!(params.ds_merchant_cof_type, Some(CofType::R));
        assert_eq!(params.ds_merchant_cof_ini, Some(CofMarker::N));
    }

    #[test]
    fn test_exemption_keeps_existing_cof_fields() {
        let params = base_params()
            .with_sca(card_on_file(
                CofType::C,
                CofMarker::S,
                CofMarker::N,
                CofMarker::S,
                Some("999999999999".to_string()),
            ))
            .with_sca(transaction_risk_analysis());

        assert_eq!(params.ds_merchant_excep_sca, Some(ScaException::Tra));
        assert_eq!(params.ds_merchant_cof_type, Some(CofType::C));
        assert_eq!(
            params.ds_merchant_cof_txnid.as_deref(),
            Some("999999999999")
        );
    }

    #[test]
    fn test_exception_markers_serialize_as_gateway_literals() {
        for (exception, literal) in [
            (ScaException::Mit, "\"MIT\""),
            (ScaException::Lwv, "\"LWV\""),
            (ScaException::Tra, "\"TRA\""),
            (ScaException::Cor, "\"COR\""),
        ] {
            assert_eq!(
                serde_json::to_string(&exception).expect("Serialized marker"),
                literal
            );
        }
    }

    #[test]
    fn test_emv3ds_drops_absent_fields() {
        let data = Emv3DsData {
            cardholder_name: Some(Secret::new("First Last".to_string())),
            browser_data: Some(BrowserData {
                browser_language: Some("es-ES".to_string()),
                ..BrowserData::default()
            }),
            ..Emv3DsData::default()
        };

        let serialized = build_emv3ds(&data).expect("EMV3DS payload");
        assert_eq!(
            serialized,
            r#"{"browserLanguage":"es-ES","cardholderName":"First Last"}"#
        );
    }

    #[test]
    fn test_emv3ds_attaches_as_string_field() {
        let params = base_params()
            .with_emv3ds(&Emv3DsData::default())
            .expect("EMV3DS attachment");
        assert_eq!(params.ds_merchant_emv3ds.as_deref(), Some("{}"));
    }
}
