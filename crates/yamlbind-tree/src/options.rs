//! Codec configuration shared by the parser and the emitter.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default number of spaces per indentation level when emitting.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Default quote character.
pub const DEFAULT_QUOTE: char = '"';

/// Default recursion guard.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options controlling how documents are read and written.
///
/// Parsing infers indentation from column positions, so `indent_width`
/// only affects emission. `quote` is honoured in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CodecOptions {
    pub indent_width: usize,
    pub quote: char,
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            quote: DEFAULT_QUOTE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Check that the options describe a usable dialect.
    pub fn validate(&self) -> Result<()> {
        if self.indent_width < 2 {
            return Err(Error::Structural {
                message: format!(
                    "indent width must be at least 2, got {}",
                    self.indent_width
                ),
                location: None,
            });
        }
        if self.quote != '"' && self.quote != '\'' {
            return Err(Error::Structural {
                message: format!("quote character must be '\"' or '\\'', got '{}'", self.quote),
                location: None,
            });
        }
        if self.max_depth == 0 {
            return Err(Error::Structural {
                message: "max depth must be positive".to_string(),
                location: None,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CodecOptions::default();
        assert_eq!(options.indent_width, 4);
        assert_eq!(options.quote, '"');
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_dialect() {
        assert!(CodecOptions::new().with_indent_width(1).validate().is_err());
        assert!(CodecOptions::new().with_quote('`').validate().is_err());
        assert!(CodecOptions::new().with_quote('\'').validate().is_ok());
    }
}
