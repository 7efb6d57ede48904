use crate::error::{ChainError, Result};
use crate::transaction::types::NewTransaction;
use serde_json::Value;

/// Fields a submission must carry. The timestamp is never accepted from
/// callers.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "sender_urn",
    "recipient_urn",
    "chemical_urn",
    "quantity",
    "unit",
    "event_type",
    "details",
];

/// Checks required-field presence on a raw submission body and decodes it.
/// Unknown keys are ignored.
pub fn parse_submission(body: &Value) -> Result<NewTransaction> {
    let object = body.as_object().ok_or_else(|| {
        ChainError::InvalidTransaction("submission must be a JSON object".to_string())
    })?;

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(ChainError::InvalidTransaction(format!(
            "Missing values: {}",
            missing.join(", ")
        )));
    }

    serde_json::from_value(body.clone())
        .map_err(|e| ChainError::InvalidTransaction(format!("Malformed field: {}", e)))
}
