// Error types for schema compilation, validation and binding

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use yamlbind_tree::SourceInfo;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which class of failure an [`Error`] belongs to.
///
/// `Structural`, `Reference` and `Binding` point at a broken schema or a
/// schema/class mismatch; `Validation` means the input document is bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Structural,
    Reference,
    Binding,
    Validation,
    Io,
}

/// Errors returned by every codec entry point.
///
/// Every error aborts the whole call; no partial result is returned.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed document or schema syntax, or a schema shape rule violation.
    #[error("{message}{}", display_location(.location))]
    Structural {
        message: String,
        location: Option<SourceInfo>,
    },

    /// An alias or schema `*name` that does not resolve.
    #[error("Unresolved reference '*{name}'{}", display_location(.location))]
    Reference {
        name: String,
        location: Option<SourceInfo>,
    },

    /// The schema and the bound classes do not fit together.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The document does not satisfy the schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Reading or writing a file failed.
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_location(location: &Option<SourceInfo>) -> String {
    match location {
        Some(loc) => format!(" (at {})", loc),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn structural(message: impl Into<String>, location: Option<SourceInfo>) -> Self {
        Error::Structural {
            message: message.into(),
            location,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Structural { .. } => ErrorClass::Structural,
            Error::Reference { .. } => ErrorClass::Reference,
            Error::Binding(_) => ErrorClass::Binding,
            Error::Validation(_) => ErrorClass::Validation,
            Error::Io { .. } => ErrorClass::Io,
        }
    }

    /// Stable error code, e.g. `Y-1-11`.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Structural { .. } => "Y-1-01",
            Error::Reference { .. } => "Y-1-02",
            Error::Binding(err) => err.error_code(),
            Error::Validation(err) => err.error_code(),
            Error::Io { .. } => "Y-1-90",
        }
    }

    /// The source location this error points at, if any.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::Structural { location, .. } | Error::Reference { location, .. } => {
                location.as_ref()
            }
            Error::Validation(err) => err.location.as_ref(),
            Error::Binding(_) | Error::Io { .. } => None,
        }
    }

    /// The message without the trailing location, for diagnostic titles.
    pub fn message(&self) -> String {
        match self {
            Error::Structural { message, .. } => message.clone(),
            Error::Reference { name, .. } => format!("Unresolved reference '*{}'", name),
            Error::Validation(err) => err.message(),
            other => other.to_string(),
        }
    }
}

impl From<yamlbind_tree::Error> for Error {
    fn from(err: yamlbind_tree::Error) -> Self {
        match err {
            yamlbind_tree::Error::Structural { message, location } => {
                Error::Structural { message, location }
            }
            yamlbind_tree::Error::Reference { name, location } => Error::Reference { name, location },
            yamlbind_tree::Error::DepthExceeded { limit, location } => Error::Structural {
                message: format!("Nesting exceeds the maximum depth of {}", limit),
                location,
            },
        }
    }
}

/// The schema names a class or member the accessor cannot provide, or a
/// bound value has a runtime kind the schema cannot carry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("No class '{class}' is registered")]
    UnknownClass { class: String },

    #[error("Class '{class}' has no member '{member}'")]
    UnknownMember { class: String, member: String },

    #[error("Member '{member}' of '{class}' cannot hold a {got} value (expected {expected})")]
    UnsupportedType {
        class: String,
        member: String,
        expected: String,
        got: String,
    },

    #[error("Member '{member}' must hold an object, found {got}")]
    NotAnObject { member: String, got: String },
}

impl BindingError {
    pub fn error_code(&self) -> &'static str {
        match self {
            BindingError::UnknownClass { .. } => "Y-1-30",
            BindingError::UnknownMember { .. } => "Y-1-31",
            BindingError::UnsupportedType { .. } => "Y-1-32",
            BindingError::NotAnObject { .. } => "Y-1-33",
        }
    }
}

/// Structured validation error kinds
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ValidationErrorKind {
    /// Lexical type of the data does not match the declared type
    TypeMismatch { expected: String, got: String },

    /// A required property is absent
    MissingRequiredProperty { property: String },

    /// A required property is present but empty, `null` or `""`
    RequiredValueEmpty { property: String },

    /// A numeric bound was broken
    NumberOutOfRange { value: f64, limit: NumericLimit },

    /// Text has too few or too many characters
    StringLengthInvalid { length: usize, limit: CountLimit },

    /// No match for a `pattern`
    StringPatternMismatch { value: String, pattern: String },

    /// A sequence has too few or too many elements
    ArrayLengthInvalid { count: usize, limit: CountLimit },

    /// NaN or infinity where a number is declared
    NonFiniteNumber { value: String },
}

/// The numeric bound a value broke, with its operand.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NumericLimit {
    /// `minimum`
    AtLeast(f64),
    /// `maximum`
    AtMost(f64),
    /// `exclusiveMinimum`
    Above(f64),
    /// `exclusiveMaximum`
    Below(f64),
}

impl NumericLimit {
    /// Whether `value` lies within this bound.
    pub fn admits(self, value: f64) -> bool {
        match self {
            NumericLimit::AtLeast(min) => value >= min,
            NumericLimit::AtMost(max) => value <= max,
            NumericLimit::Above(min) => value > min,
            NumericLimit::Below(max) => value < max,
        }
    }
}

impl fmt::Display for NumericLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericLimit::AtLeast(n) => write!(f, "at least {}", n),
            NumericLimit::AtMost(n) => write!(f, "at most {}", n),
            NumericLimit::Above(n) => write!(f, "greater than {}", n),
            NumericLimit::Below(n) => write!(f, "less than {}", n),
        }
    }
}

/// A broken `minLength`/`maxLength` or `minItems`/`maxItems` bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CountLimit {
    AtLeast(usize),
    AtMost(usize),
}

impl fmt::Display for CountLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountLimit::AtLeast(n) => write!(f, "at least {}", n),
            CountLimit::AtMost(n) => write!(f, "at most {}", n),
        }
    }
}

impl ValidationErrorKind {
    /// Get the error code for this error kind
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationErrorKind::MissingRequiredProperty { .. } => "Y-1-10",
            ValidationErrorKind::TypeMismatch { .. } => "Y-1-11",
            ValidationErrorKind::RequiredValueEmpty { .. } => "Y-1-12",
            ValidationErrorKind::ArrayLengthInvalid { .. } => "Y-1-13",
            ValidationErrorKind::StringPatternMismatch { .. } => "Y-1-14",
            ValidationErrorKind::NumberOutOfRange { .. } => "Y-1-15",
            ValidationErrorKind::NonFiniteNumber { .. } => "Y-1-16",
            ValidationErrorKind::StringLengthInvalid { .. } => "Y-1-20",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ValidationErrorKind::TypeMismatch { expected, got } => {
                format!("Declared type is {}, but the value reads as {}", expected, got)
            }
            ValidationErrorKind::MissingRequiredProperty { property } => {
                format!("Required property '{}' is missing", property)
            }
            ValidationErrorKind::RequiredValueEmpty { property } => {
                format!("Required property '{}' has no value", property)
            }
            ValidationErrorKind::NumberOutOfRange { value, limit } => {
                format!("Value {} must be {}", value, limit)
            }
            ValidationErrorKind::StringLengthInvalid { length, limit } => {
                format!("Expected {} characters, found {}", limit, length)
            }
            ValidationErrorKind::StringPatternMismatch { value, pattern } => {
                format!("'{}' contains no match for `{}`", value, pattern)
            }
            ValidationErrorKind::ArrayLengthInvalid { count, limit } => {
                format!("Expected {} items, found {}", limit, count)
            }
            ValidationErrorKind::NonFiniteNumber { value } => {
                format!("{} has no finite numeric form", value)
            }
        }
    }
}

/// Validation error with source location information
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// Where in the document the error occurred, e.g. `people.[2].name`
    pub instance_path: InstancePath,
    /// Location of the offending data node, when decoding or validating
    pub location: Option<SourceInfo>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at `{}`", self.kind.message(), self.instance_path)?;
        if let Some(loc) = &self.location {
            write!(f, " ({})", loc)?;
        }
        Ok(())
    }
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, instance_path: InstancePath) -> Self {
        Self {
            kind,
            instance_path,
            location: None,
        }
    }

    pub fn with_location(mut self, location: SourceInfo) -> Self {
        self.location = Some(location);
        self
    }

    pub fn message(&self) -> String {
        self.kind.message()
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }
}

/// Keys and sequence indices leading from the document to a data node.
///
/// Displayed as the segments joined by `.`, indices in brackets
/// (`people.[2].name`); the document itself shows as `<document>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePath {
    segments: Vec<PathSegment>,
}

impl InstancePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((first, rest)) = self.segments.split_first() else {
            return f.write_str("<document>");
        };
        write!(f, "{}", first)?;
        rest.iter().try_for_each(|segment| write!(f, ".{}", segment))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Position in a sequence
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_path_display() {
        let mut path = InstancePath::new();
        assert_eq!(path.to_string(), "<document>");

        path.push_key("people");
        path.push_index(2);
        path.push_key("name");
        assert_eq!(path.to_string(), "people.[2].name");

        assert_eq!(path.pop(), Some(PathSegment::Key("name".into())));
        assert_eq!(path.segments().len(), 2);
    }

    #[test]
    fn test_error_classes_and_codes() {
        let err = Error::from(ValidationError::new(
            ValidationErrorKind::MissingRequiredProperty {
                property: "name".into(),
            },
            InstancePath::new(),
        ));
        assert_eq!(err.class(), ErrorClass::Validation);
        assert_eq!(err.error_code(), "Y-1-10");
        assert_eq!(
            err.to_string(),
            "Required property 'name' is missing at `<document>`"
        );

        let err = Error::from(BindingError::UnknownClass {
            class: "Person".into(),
        });
        assert_eq!(err.class(), ErrorClass::Binding);
        assert_eq!(err.error_code(), "Y-1-30");
    }

    #[test]
    fn test_tree_errors_convert() {
        let depth = yamlbind_tree::Error::DepthExceeded {
            limit: 3,
            location: None,
        };
        let err = Error::from(depth);
        assert_eq!(err.class(), ErrorClass::Structural);
        assert_eq!(err.to_string(), "Nesting exceeds the maximum depth of 3");

        let alias = yamlbind_tree::Error::Reference {
            name: "base".into(),
            location: None,
        };
        assert_eq!(Error::from(alias).class(), ErrorClass::Reference);
    }

    #[test]
    fn test_bound_messages() {
        let kind = ValidationErrorKind::NumberOutOfRange {
            value: 5.0,
            limit: NumericLimit::Above(5.0),
        };
        assert_eq!(kind.message(), "Value 5 must be greater than 5");
        assert_eq!(kind.error_code(), "Y-1-15");

        let kind = ValidationErrorKind::ArrayLengthInvalid {
            count: 3,
            limit: CountLimit::AtMost(2),
        };
        assert_eq!(kind.message(), "Expected at most 2 items, found 3");

        let kind = ValidationErrorKind::StringLengthInvalid {
            length: 2,
            limit: CountLimit::AtLeast(3),
        };
        assert_eq!(kind.message(), "Expected at least 3 characters, found 2");
    }

    #[test]
    fn test_numeric_limits() {
        assert!(NumericLimit::AtLeast(0.0).admits(0.0));
        assert!(!NumericLimit::Above(0.0).admits(0.0));
        assert!(NumericLimit::Below(1.5).admits(1.4));
        assert!(!NumericLimit::AtMost(1.5).admits(1.6));
    }

    #[test]
    fn test_validation_error_display_with_location() {
        let mut path = InstancePath::new();
        path.push_key("age");
        let err = ValidationError::new(
            ValidationErrorKind::NumberOutOfRange {
                value: -1.0,
                limit: NumericLimit::AtLeast(0.0),
            },
            path,
        )
        .with_location(SourceInfo::new(Some("p.yaml".into()), 8, 2, 6, 2));
        assert_eq!(err.to_string(), "Value -1 must be at least 0 at `age` (p.yaml:2:6)");
    }
}
