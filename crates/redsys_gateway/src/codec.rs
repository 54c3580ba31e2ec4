//! Canonical JSON + Base64 codec for the merchant parameter envelope.
//!
//! Encoding is part of the wire contract, not cosmetics: the signature is
//! computed over the serialized bytes, so the same logical parameter set must
//! always produce byte-identical output. Keys are ordered lexicographically
//! (byte-wise over the exact key strings) and the JSON carries no whitespace.

use base64::Engine;
use error_stack::ResultExt;
use serde::Serialize;

use crate::{
    consts,
    errors::{CustomResult, SignatureError},
};

/// Serializes `params` as a canonical JSON object and Base64-encodes it.
///
/// Absent optional fields are dropped by serialization; the remaining keys
/// come out sorted because `serde_json` objects are BTree-backed.
pub fn encode<T: Serialize>(params: &T) -> CustomResult<String, SignatureError> {
    let value = serde_json::to_value(params).change_context(SignatureError::EncodingFailed)?;
    let json = serde_json::to_string(&value).change_context(SignatureError::EncodingFailed)?;
    Ok(consts::BASE64_ENGINE.encode(json))
}

/// Base64-decodes and JSON-parses a received envelope.
pub fn decode(envelope: &str) -> CustomResult<serde_json::Value, SignatureError> {
    let bytes = consts::BASE64_ENGINE
        .decode(envelope)
        .change_context(SignatureError::MalformedEnvelope)
        .attach_printable("Envelope is not valid Base64")?;
    serde_json::from_slice(&bytes)
        .change_context(SignatureError::MalformedEnvelope)
        .attach_printable("Envelope does not contain valid JSON")
}

/// Key spellings under which the gateway (or our own signing path) carries
/// the order identifier. Notifications use the `Ds_Order` casing, outbound
/// envelopes the `DS_MERCHANT_ORDER` one.
const ORDER_ID_KEYS: [&str; 4] = [
    "Ds_Order",
    "DS_ORDER",
    "Ds_Merchant_Order",
    "DS_MERCHANT_ORDER",
];

/// Extracts the order identifier from a decoded envelope.
pub fn order_id(parameters: &serde_json::Value) -> CustomResult<String, SignatureError> {
    ORDER_ID_KEYS
        .iter()
        .find_map(|key| parameters.get(key))
        .and_then(|value| match value {
            serde_json::Value::String(order) => Some(order.clone()),
            serde_json::Value::Number(order) => Some(order.to_string()),
            _ => None,
        })
        .ok_or_else(|| SignatureError::MissingOrderId.into())
}
