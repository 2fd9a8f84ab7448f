//! Scalar formatter: bound values to document text and back, under a
//! declared schema type.

use crate::schema::SchemaType;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use yamlbind_tree::{RESERVED_CHARS, Scalar, ValueType, classify, is_iso_timestamp, quote_scalar};

/// Why a scalar could not be formatted or parsed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScalarError {
    /// The runtime value (or the text) does not fit the declared type.
    Mismatch {
        expected: SchemaType,
        got: &'static str,
    },
    /// NaN or an infinity under a numeric type.
    NonFinite(f64),
    /// The declared type has no scalar form.
    Unsupported(SchemaType),
}

/// ISO-8601 UTC rendering of a timestamp, e.g. `2024-01-02T10:30:00Z`.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Decimal text that always carries a `.`: `0.0`, `2.0`, `-0.25`.
pub fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        return Some("0.0".to_string());
    }
    let text = value.to_string();
    if text.contains('.') {
        Some(text)
    } else {
        Some(format!("{}.0", text))
    }
}

/// Whether a bare sequence scalar needs quotes to read back as the same
/// string.
pub fn needs_quotes(text: &str, quote: char) -> bool {
    text.is_empty()
        || text.trim() != text
        || text.eq_ignore_ascii_case("null")
        || text.contains(|c: char| c == quote || c.is_control() || RESERVED_CHARS.contains(&c))
        || classify(text) != ValueType::String
}

/// Text of a scalar value under `declared`, without quotes.
///
/// `None` means the value is null.
pub(crate) fn scalar_text(value: &Value, declared: SchemaType) -> Result<Option<String>, ScalarError> {
    if value.is_null() {
        return Ok(None);
    }
    let mismatch = || ScalarError::Mismatch {
        expected: declared,
        got: value.kind_name(),
    };
    let text = match declared {
        SchemaType::String => match value {
            Value::String(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.to_string(),
            Value::DateTime(dt) => format_datetime(dt),
            _ => return Err(mismatch()),
        },
        SchemaType::Integer => match value {
            Value::Integer(i) => i.to_string(),
            _ => return Err(mismatch()),
        },
        SchemaType::Number => {
            let n = match value {
                Value::Number(n) => *n,
                Value::Integer(i) => *i as f64,
                _ => return Err(mismatch()),
            };
            format_number(n).ok_or(ScalarError::NonFinite(n))?
        }
        SchemaType::Boolean => match value {
            Value::Boolean(b) => b.to_string(),
            _ => return Err(mismatch()),
        },
        SchemaType::Null => return Ok(None),
        SchemaType::Array | SchemaType::Object => return Err(ScalarError::Unsupported(declared)),
    };
    Ok(Some(text))
}

/// Render scalar text for emission.
///
/// Strings under a key are always quoted; bare sequence entries only when
/// they would otherwise read back differently.
pub(crate) fn render(text: Option<&str>, declared: SchemaType, quote: char, in_sequence: bool) -> String {
    match text {
        None => "null".to_string(),
        Some(text) if declared == SchemaType::String => {
            if !in_sequence || needs_quotes(text, quote) {
                quote_scalar(text, quote)
            } else {
                text.to_string()
            }
        }
        Some(text) => text.to_string(),
    }
}

/// Convert data text into a bound value of `declared` type.
///
/// ISO-8601 dates, times and timestamps become date values even under a
/// `string` declaration; text that only looks like one stays a string.
/// Unquoted empty text is absence, a quoted `""` is the empty string.
pub(crate) fn text_to_value(scalar: &Scalar, declared: SchemaType) -> Result<Value, ScalarError> {
    let text = scalar.text.as_str();
    let trimmed = text.trim();
    if declared == SchemaType::Null || (text.is_empty() && !scalar.quoted) {
        return Ok(Value::Null);
    }
    let mismatch = || ScalarError::Mismatch {
        expected: declared,
        got: classify(trimmed).as_str(),
    };
    match declared {
        SchemaType::String => {
            if is_iso_timestamp(trimmed)
                && let Some(value) = parse_timestamp(trimmed)
            {
                return Ok(value);
            }
            Ok(Value::String(text.to_string()))
        }
        SchemaType::Integer => trimmed
            .trim_start_matches('+')
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| mismatch()),
        SchemaType::Number => trimmed
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or_else(mismatch),
        SchemaType::Boolean => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(Value::Boolean(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(Value::Boolean(false))
            } else {
                Err(mismatch())
            }
        }
        SchemaType::Array | SchemaType::Object => Err(ScalarError::Unsupported(declared)),
        SchemaType::Null => Ok(Value::Null),
    }
}

fn parse_timestamp(text: &str) -> Option<Value> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Value::Date(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Value::DateTime(dt.with_timezone(&Utc)));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Value::DateTime(dt.and_utc()));
        }
    }
    for format in ["%H:%M:%S%.f", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(text, format) {
            return Some(Value::Time(time));
        }
    }
    None
}
