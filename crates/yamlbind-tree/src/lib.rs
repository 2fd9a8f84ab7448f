//! # yamlbind-tree
//!
//! Indentation-sensitive parsing of a YAML subset into a generic node tree.
//!
//! This crate is the text layer of the codec. It knows nothing about
//! schemas or bound objects: it validates raw lines, classifies scalar
//! text, and builds [`Node`] trees that carry a [`SourceInfo`] for every
//! node.
//!
//! ## Dialect
//!
//! - A document starts with a line that is exactly `---` and may end with `...`.
//! - Indentation is spaces only and is inferred from column positions.
//! - `#` starts a comment outside quotes.
//! - `key: value` entries, `- ` sequence items, `|`/`>` text blocks,
//!   inline `[a, b]` sequences and `{k: v}` mappings, `&anchor`/`*alias`.
//!
//! ## Example
//!
//! ```rust
//! use yamlbind_tree::{parse, ValueType};
//!
//! let content = "---\ntitle: My Document\ntags:\n  - a\n  - b\n...";
//!
//! let doc = parse(content).unwrap();
//! let tags = doc.get("tags").unwrap();
//! assert_eq!(tags.value_type(), ValueType::Array);
//! assert_eq!(tags.items().count(), 2);
//! ```

mod classify;
mod error;
mod lexer;
mod node;
mod options;
mod parser;
mod source_info;
mod validate;

pub use classify::{ValueType, classify, classify_opt, is_iso_timestamp, is_signed_number};
pub use error::{Error, Result};
pub use lexer::{RESERVED_CHARS, quote_scalar, split_flow_items, unescape};
pub use node::{Node, NodeKind, Scalar};
pub use options::{CodecOptions, DEFAULT_INDENT_WIDTH, DEFAULT_MAX_DEPTH, DEFAULT_QUOTE};
pub use parser::{ParseMode, parse, parse_file, parse_lines, parse_named, parse_with};
pub use source_info::SourceInfo;
pub use validate::{validate_lines, validate_text};

