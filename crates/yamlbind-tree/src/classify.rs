//! Lexical scalar classification.
//!
//! Both the decoder and the validator compare the lexical type of a data
//! scalar against the declared schema type, so the mapping below has to
//! stay exactly as it is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Lexical type of a scalar's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Integer => "integer",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static ISO_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{4}-\d{2}-\d{2}(?:[Tt ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:[Zz]|[+-]\d{2}:?\d{2})?)?$",
    )
    .unwrap()
});

static ISO_TIME_OF_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:[Zz]|[+-]\d{2}:?\d{2})?$").unwrap());

/// Whether `text` has the shape of an ISO-8601 date, date-time or time of day.
pub fn is_iso_timestamp(text: &str) -> bool {
    ISO_TIMESTAMP.is_match(text) || ISO_TIME_OF_DAY.is_match(text)
}

/// Classify scalar text. Pure and total.
///
/// Note that `null` classifies as [`ValueType::Object`], not
/// [`ValueType::Null`]; existing schemas rely on it.
pub fn classify(text: &str) -> ValueType {
    let text = text.trim();
    if text.is_empty() {
        return ValueType::Null;
    }
    if is_iso_timestamp(text) {
        return ValueType::String;
    }
    if let Some(numeric) = classify_numeric(text) {
        return numeric;
    }
    if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
        return ValueType::Boolean;
    }
    if text.eq_ignore_ascii_case("null") {
        return ValueType::Object;
    }
    if text.starts_with('[') && text.ends_with(']') {
        return ValueType::Array;
    }
    ValueType::String
}

/// Classify optional scalar text; absence is `Null`.
pub fn classify_opt(text: Option<&str>) -> ValueType {
    text.map_or(ValueType::Null, classify)
}

/// Leading digit or sign, at most one sign, at most one interior `.`,
/// nothing else but digits.
fn classify_numeric(text: &str) -> Option<ValueType> {
    let chars: Vec<char> = text.chars().collect();
    let first = chars[0];
    if !(first.is_ascii_digit() || first == '+' || first == '-') {
        return None;
    }

    let mut digits = 0;
    let mut dot = None;
    for (i, c) in chars.iter().enumerate() {
        match c {
            '0'..='9' => digits += 1,
            '+' | '-' if i == 0 => {}
            '.' if dot.is_none() => dot = Some(i),
            _ => return None,
        }
    }

    if digits == 0 {
        return None;
    }
    match dot {
        // The point must sit strictly inside the text.
        Some(i) if i == 0 || i == chars.len() - 1 => None,
        Some(_) => Some(ValueType::Number),
        None => Some(ValueType::Integer),
    }
}

/// Whether `text` is a number carrying an explicit sign, e.g. `-12`.
pub fn is_signed_number(text: &str) -> bool {
    (text.starts_with('-') || text.starts_with('+'))
        && matches!(classify(text), ValueType::Integer | ValueType::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_mapping() {
        assert_eq!(classify(""), ValueType::Null);
        assert_eq!(classify("true"), ValueType::Boolean);
        assert_eq!(classify("FALSE"), ValueType::Boolean);
        assert_eq!(classify("-12.5"), ValueType::Number);
        assert_eq!(classify("7"), ValueType::Integer);
        assert_eq!(classify("+7"), ValueType::Integer);
        assert_eq!(classify("[1,2]"), ValueType::Array);
        assert_eq!(classify("hello"), ValueType::String);
    }

    #[test]
    fn test_null_text_is_object() {
        assert_eq!(classify("null"), ValueType::Object);
        assert_eq!(classify("NULL"), ValueType::Object);
        assert_eq!(classify_opt(None), ValueType::Null);
    }

    #[test]
    fn test_numeric_edges() {
        assert_eq!(classify(".5"), ValueType::String);
        assert_eq!(classify("5."), ValueType::String);
        assert_eq!(classify("1.2.3"), ValueType::String);
        assert_eq!(classify("--1"), ValueType::String);
        assert_eq!(classify("1-2"), ValueType::String);
        assert_eq!(classify("-"), ValueType::String);
        assert_eq!(classify("+.5"), ValueType::Number);
        assert_eq!(classify("1e5"), ValueType::String);
    }

    #[test]
    fn test_timestamps_are_strings() {
        assert_eq!(classify("2024-01-02"), ValueType::String);
        assert_eq!(classify("2024-01-02T03:04:05Z"), ValueType::String);
        assert_eq!(classify("12:30:00"), ValueType::String);
        assert!(is_iso_timestamp("2024-01-02T03:04:05.123+02:00"));
        assert!(!is_iso_timestamp("2024-1-2"));
    }

    #[test]
    fn test_signed_number() {
        assert!(is_signed_number("-3"));
        assert!(is_signed_number("+3.5"));
        assert!(!is_signed_number("3"));
        assert!(!is_signed_number("-x"));
    }

    #[test]
    fn test_never_panics_on_odd_input() {
        for text in ["+", ".", "-.", "[", "]", "  ", "é", "0", "00.00"] {
            let _ = classify(text);
        }
    }
}
