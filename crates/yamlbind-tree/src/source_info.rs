//! Source location information for parsed nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location of a line-based YAML element.
///
/// The line parser works on whole lines, so a location always points at
/// the first character of a node's content on its line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Optional filename or source identifier
    pub file: Option<String>,

    /// Character offset from start of source (0-based)
    pub offset: usize,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based, in characters not bytes)
    pub col: usize,

    /// Length in characters
    pub len: usize,
}

impl SourceInfo {
    /// Create a new SourceInfo with all fields specified.
    pub fn new(file: Option<String>, offset: usize, line: usize, col: usize, len: usize) -> Self {
        Self {
            file,
            offset,
            line,
            col,
            len,
        }
    }

    /// Set the filename for this source location.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Get the end offset (exclusive) of this location.
    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            file: None,
            offset: 0,
            line: 1,
            col: 1,
            len: 0,
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.col),
            None => write!(f, "line {}, column {}", self.line, self.col),
        }
    }
}
