//! # yamlbind
//!
//! Schema-driven YAML codec.
//!
//! A schema is itself a YAML document in a restricted JSON-Schema-like
//! dialect. [`Codec`] compiles it once and then validates documents,
//! decodes them into bound [`Object`]s and encodes objects back into
//! canonical text. Reads and writes of object members go through an
//! [`Accessor`], so hosts decide how classes and members are laid out.
//!
//! ## Schema dialect
//!
//! ```yaml
//! ---
//! definitions:
//!   address:
//!     type: object
//!     mapping: Address
//!     properties:
//!       city: string
//! properties:
//!   name:
//!     type: string
//!     minLength: 1
//!   tags:
//!     type: array
//!     maxItems: 5
//!     items: string[]
//!   home: *address
//! required: [name]
//! ```
//!
//! - `type`: `string`, `number`, `integer`, `boolean`, `array`, `object`
//!   or `null`. A bare type name may stand in for the whole node.
//! - `items` (arrays) and `properties` (objects); `*name` points into
//!   `definitions`.
//! - `[]` on a scalar `items` type binds the elements to a fixed-size
//!   native array.
//! - `mapping: "member:Class"` renames the bound member and names the class
//!   to construct; `mapping: Class` only names the class.
//! - Restrictions: `minimum`, `maximum`, `exclusiveMinimum`,
//!   `exclusiveMaximum`, `minLength`, `maxLength`, `minItems`,
//!   `maxItems`, `pattern` (Rust `regex` syntax, unanchored).
//!
//! ## Errors
//!
//! Every failure aborts the call. [`Error::class`] tells a broken schema
//! or class pairing (`Structural`, `Reference`, `Binding`) apart from bad
//! input data (`Validation`).

mod binding;
mod codec;
mod decode;
mod encode;
mod error;
mod format;
pub mod restriction;
pub mod schema;
mod source;
mod value;

pub use binding::{Accessor, ClassDef, ClassRegistry, ClassRegistryBuilder, DynamicAccessor, MemberKind};
pub use codec::Codec;
pub use error::{
    BindingError, CountLimit, Error, ErrorClass, InstancePath, NumericLimit, PathSegment, Result,
    ValidationError, ValidationErrorKind,
};
pub use format::{format_datetime, format_number, needs_quotes};
pub use schema::{Schema, SchemaId, SchemaNode, SchemaType};
pub use source::{FsSource, TextSource};
pub use value::{Object, PrimitiveArray, ScalarKind, Value};

pub use yamlbind_tree::{CodecOptions, Node, SourceInfo, ValueType, classify};
