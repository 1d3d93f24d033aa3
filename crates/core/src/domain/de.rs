//! Lenient field deserializers for ERP payloads.
//!
//! Dolibarr returns the same column as a string on one endpoint and as a
//! number on another, so identifiers and coordinates are normalized to
//! `Option<String>`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a string, number, bool or null.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| value_to_string(&v)))
}

/// Like [`opt_string`] but maps a missing value to an empty string.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    opt_string(deserializer).map(Option::unwrap_or_default)
}

/// Render a scalar JSON value the way the ERP would have sent it as text.
#[must_use]
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Whether a JSON value would count as "set" in a loosely typed client:
/// not null, false, zero or an empty string.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}
