//! Value predicates and coercions shared by every handler.
//!
//! Tag configuration and event data arrive as loosely typed JSON, so the
//! helpers here operate on [`serde_json::Value`] and mirror the coercion
//! rules the tag template has always applied to UI fields.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Characters left untouched by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A value is usable unless it is null, absent, or the empty string.
///
/// Zero, `false` and non-empty strings are all valid.
#[inline]
pub fn is_valid_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Percent-encode a value for use as a query key or value.
///
/// Null and absent values encode to the empty string.
pub fn encode_param(value: Option<&Value>) -> String {
    let raw = match value {
        None | Some(Value::Null) => String::new(),
        Some(v) => make_string(v),
    };
    utf8_percent_encode(&raw, URI_COMPONENT).to_string()
}

/// Percent-encode a plain string with the same rules as [`encode_param`].
#[inline]
pub fn encode_str(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

/// Render a JSON value the way a script runtime would stringify it.
pub fn make_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Coerce a value to an integer, truncating toward zero.
///
/// Returns `None` when the value has no numeric reading or its integer part
/// does not fit in an `i64`.
pub fn make_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_float))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn truncate_float(f: f64) -> Option<i64> {
    // 2^63 is exact as an f64; i64::MAX is not.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let t = f.trunc();
    (t.is_finite() && t >= -LIMIT && t < LIMIT).then(|| t as i64)
}

/// Script-style truthiness of a JSON value.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// UI checkbox fields accept either a literal `true` or the string `"true"`.
#[inline]
pub fn is_ui_field_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}
