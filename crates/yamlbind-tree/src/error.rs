//! Error types for line validation and tree parsing.

use crate::SourceInfo;
use thiserror::Error;

/// Result type alias for yamlbind-tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating or parsing document lines.
///
/// Every error aborts the whole call; no partial tree is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed syntax: bad indentation, bracket or colon violations,
    /// tabs, a missing `---` header, illegal value starts.
    #[error("{message}{}", display_location(.location))]
    Structural {
        message: String,
        location: Option<SourceInfo>,
    },

    /// An alias `*name` without a prior `&name` anchor.
    #[error("Unresolved alias '*{name}'{}", display_location(.location))]
    Reference {
        name: String,
        location: Option<SourceInfo>,
    },

    /// Document nesting exceeded the configured maximum depth.
    #[error("Nesting exceeds the maximum depth of {limit}{}", display_location(.location))]
    DepthExceeded {
        limit: usize,
        location: Option<SourceInfo>,
    },
}

fn display_location(location: &Option<SourceInfo>) -> String {
    match location {
        Some(loc) => format!(" (at {})", loc),
        None => String::new(),
    }
}

impl Error {
    /// Shorthand for a structural error at a known location.
    pub fn structural(message: impl Into<String>, location: SourceInfo) -> Self {
        Error::Structural {
            message: message.into(),
            location: Some(location),
        }
    }

    /// The source location this error points at, if any.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::Structural { location, .. }
            | Error::Reference { location, .. }
            | Error::DepthExceeded { location, .. } => location.as_ref(),
        }
    }
}
