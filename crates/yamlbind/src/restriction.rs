//! Restriction engine: one schema constraint against one value.

use crate::error::{CountLimit, NumericLimit, ValidationErrorKind};
use crate::schema::SchemaType;
use regex::Regex;
use std::fmt;
use yamlbind_tree::classify;

/// A compiled `pattern` operand.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Unanchored search.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// One schema-declared constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Restriction {
    Minimum(f64),
    Maximum(f64),
    ExclusiveMinimum(f64),
    ExclusiveMaximum(f64),
    MinLength(usize),
    MaxLength(usize),
    MinItems(usize),
    MaxItems(usize),
    Pattern(Pattern),
}

impl Restriction {
    /// The schema keyword that declares this restriction.
    pub fn keyword(&self) -> &'static str {
        match self {
            Restriction::Minimum(_) => "minimum",
            Restriction::Maximum(_) => "maximum",
            Restriction::ExclusiveMinimum(_) => "exclusiveMinimum",
            Restriction::ExclusiveMaximum(_) => "exclusiveMaximum",
            Restriction::MinLength(_) => "minLength",
            Restriction::MaxLength(_) => "maxLength",
            Restriction::MinItems(_) => "minItems",
            Restriction::MaxItems(_) => "maxItems",
            Restriction::Pattern(_) => "pattern",
        }
    }

    /// Whether this restriction may be declared on a node of type `declared`.
    pub fn applies_to(&self, declared: SchemaType) -> bool {
        match self {
            Restriction::Minimum(_)
            | Restriction::Maximum(_)
            | Restriction::ExclusiveMinimum(_)
            | Restriction::ExclusiveMaximum(_) => {
                matches!(declared, SchemaType::Number | SchemaType::Integer)
            }
            Restriction::MinLength(_) | Restriction::MaxLength(_) => declared == SchemaType::String,
            Restriction::MinItems(_) | Restriction::MaxItems(_) => declared == SchemaType::Array,
            Restriction::Pattern(_) => matches!(
                declared,
                SchemaType::String | SchemaType::Boolean | SchemaType::Number | SchemaType::Integer
            ),
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::Minimum(n)
            | Restriction::Maximum(n)
            | Restriction::ExclusiveMinimum(n)
            | Restriction::ExclusiveMaximum(n) => write!(f, "{}: {}", self.keyword(), n),
            Restriction::MinLength(n)
            | Restriction::MaxLength(n)
            | Restriction::MinItems(n)
            | Restriction::MaxItems(n) => write!(f, "{}: {}", self.keyword(), n),
            Restriction::Pattern(p) => write!(f, "pattern: {}", p.as_str()),
        }
    }
}

/// Why a check failed.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    /// The data violates the restriction.
    Violation(ValidationErrorKind),
    /// The restriction cannot apply to the declared type. A schema problem.
    Misconfigured {
        keyword: &'static str,
        declared: SchemaType,
    },
}

impl CheckError {
    pub fn message(&self) -> String {
        match self {
            CheckError::Violation(kind) => kind.message(),
            CheckError::Misconfigured { keyword, declared } => {
                format!("Restriction '{}' cannot apply to type {}", keyword, declared)
            }
        }
    }
}

/// Check one scalar's text against one restriction.
///
/// Numeric bounds parse the text with `.` as decimal point: as a decimal
/// for `number`, as an integer for `integer`.
pub fn check(text: &str, restriction: &Restriction, declared: SchemaType) -> Result<(), CheckError> {
    if !restriction.applies_to(declared) || declared == SchemaType::Array {
        return Err(CheckError::Misconfigured {
            keyword: restriction.keyword(),
            declared,
        });
    }

    match restriction {
        Restriction::Minimum(_)
        | Restriction::Maximum(_)
        | Restriction::ExclusiveMinimum(_)
        | Restriction::ExclusiveMaximum(_) => {
            let value = parse_numeric(text, declared)?;
            check_bound(value, restriction)
        }
        Restriction::MinLength(min) => {
            let length = text.chars().count();
            if length < *min {
                return Err(CheckError::Violation(ValidationErrorKind::StringLengthInvalid {
                    length,
                    limit: CountLimit::AtLeast(*min),
                }));
            }
            Ok(())
        }
        Restriction::MaxLength(max) => {
            let length = text.chars().count();
            if length > *max {
                return Err(CheckError::Violation(ValidationErrorKind::StringLengthInvalid {
                    length,
                    limit: CountLimit::AtMost(*max),
                }));
            }
            Ok(())
        }
        Restriction::Pattern(pattern) => {
            if pattern.is_match(text) {
                Ok(())
            } else {
                Err(CheckError::Violation(ValidationErrorKind::StringPatternMismatch {
                    value: text.to_string(),
                    pattern: pattern.as_str().to_string(),
                }))
            }
        }
        Restriction::MinItems(_) | Restriction::MaxItems(_) => Err(CheckError::Misconfigured {
            keyword: restriction.keyword(),
            declared,
        }),
    }
}

/// Check every restriction in order, stopping at the first failure.
pub fn check_all(
    text: &str,
    restrictions: &[Restriction],
    declared: SchemaType,
) -> Result<(), CheckError> {
    restrictions
        .iter()
        .try_for_each(|restriction| check(text, restriction, declared))
}

/// Check `minItems`/`maxItems` against an element count. Other
/// restrictions are ignored here.
pub fn check_count(count: usize, restrictions: &[Restriction]) -> Result<(), CheckError> {
    for restriction in restrictions {
        let limit = match *restriction {
            Restriction::MinItems(min) if count < min => CountLimit::AtLeast(min),
            Restriction::MaxItems(max) if count > max => CountLimit::AtMost(max),
            _ => continue,
        };
        return Err(CheckError::Violation(ValidationErrorKind::ArrayLengthInvalid {
            count,
            limit,
        }));
    }
    Ok(())
}

fn parse_numeric(text: &str, declared: SchemaType) -> Result<f64, CheckError> {
    let text = text.trim();
    let parsed = match declared {
        SchemaType::Integer => text.parse::<i64>().ok().map(|i| i as f64),
        _ => text.parse::<f64>().ok().filter(|_| {
            matches!(
                classify(text),
                yamlbind_tree::ValueType::Number | yamlbind_tree::ValueType::Integer
            )
        }),
    };
    parsed.ok_or_else(|| {
        CheckError::Violation(ValidationErrorKind::TypeMismatch {
            expected: declared.to_string(),
            got: classify(text).to_string(),
        })
    })
}

fn check_bound(value: f64, restriction: &Restriction) -> Result<(), CheckError> {
    let limit = match *restriction {
        Restriction::Minimum(n) => NumericLimit::AtLeast(n),
        Restriction::Maximum(n) => NumericLimit::AtMost(n),
        Restriction::ExclusiveMinimum(n) => NumericLimit::Above(n),
        Restriction::ExclusiveMaximum(n) => NumericLimit::Below(n),
        _ => return Ok(()),
    };
    if limit.admits(value) {
        Ok(())
    } else {
        Err(CheckError::Violation(ValidationErrorKind::NumberOutOfRange { value, limit }))
    }
}
