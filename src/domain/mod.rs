//! Domain types and DTOs
//!
//! Typed records for budgets and change orders. Numeric fields that arrive
//! missing or malformed are read as zero so the cost engine never has to
//! reject a record.

pub mod budgets;
pub mod change_orders;

pub use budgets::*;
pub use change_orders::*;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Read a currency or quantity value, coercing anything unusable to `0.0`.
///
/// Accepts JSON numbers and numeric strings; `null`, missing fields, other
/// JSON types, unparsable strings and non-finite values all become zero.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(parse_amount).unwrap_or(0.0))
}

/// Same as [`lenient_amount`] for optional update fields: absent stays `None`.
pub fn lenient_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(parse_amount))
}

/// Read a day count. Values parse like [`lenient_amount`]; fractions round up
/// the way [`crate::cost::time_impact`] counts partial days.
pub fn lenient_days<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(parse_days).unwrap_or(0))
}

/// Same as [`lenient_days`] for optional update fields: absent stays `None`.
pub fn lenient_optional_days<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(parse_days))
}

pub fn parse_days(value: &Value) -> i64 {
    if let Value::Number(n) = value {
        if let Some(days) = n.as_i64() {
            return days;
        }
    }
    // Saturating cast; parse_amount already mapped non-finite input to zero.
    parse_amount(value).ceil() as i64
}

pub fn parse_amount(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}
