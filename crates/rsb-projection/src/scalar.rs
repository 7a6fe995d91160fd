//! Scalar conversion by type tag.

use chrono::{DateTime, FixedOffset};
use serde_json::{Number, Value};

const SIGNED: &[&str] = &["Int", "Int8", "Int16", "Int32", "Int64"];
const UNSIGNED: &[&str] = &["UInt", "UInt8", "UInt16", "UInt32", "UInt64"];

/// Date-time with optional fractional seconds and a numeric UTC offset,
/// e.g. `2024-03-01T09:15:02.250-0800`.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Convert a scalar's text per its type tag.
///
/// Numeric, boolean and date tags become JSON numbers or booleans. An
/// unknown tag, or text that does not parse under its tag, passes through
/// as a JSON string.
pub fn convert_scalar(type_name: Option<&str>, raw: &str) -> Value {
    let converted = match type_name {
        Some("Double" | "Float") => raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number),
        Some(t) if SIGNED.contains(&t) => raw.parse::<i64>().ok().map(Value::from),
        Some(t) if UNSIGNED.contains(&t) => raw.parse::<u64>().ok().map(Value::from),
        Some("Bool") => parse_bool(raw).map(Value::Bool),
        Some("Date") => parse_date_millis(raw)
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => None,
    };
    converted.unwrap_or_else(|| Value::String(raw.to_string()))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Milliseconds since the Unix epoch, rounded to three decimals.
pub fn parse_date_millis(raw: &str) -> Option<f64> {
    let parsed: DateTime<FixedOffset> = DateTime::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()?;
    let millis = parsed.timestamp() as f64 * 1000.0
        + f64::from(parsed.timestamp_subsec_nanos()) / 1_000_000.0;
    Some((millis * 1000.0).round() / 1000.0)
}
