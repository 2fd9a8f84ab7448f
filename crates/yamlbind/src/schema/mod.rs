//! Schema types and compilation
//!
//! A schema document is itself YAML: an optional `definitions` block of
//! named schemas, a root `properties` block and an optional root
//! `required` list. Compilation turns it into a [`Schema`] arena in which
//! `*name` references are indices into `definitions`.

mod compiler;
mod helpers;
mod types;

pub use compiler::compile;
pub use types::{Schema, SchemaId, SchemaNode, SchemaType};
