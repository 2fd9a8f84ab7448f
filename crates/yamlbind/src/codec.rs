//! The codec facade: compile a schema once, then validate, decode and
//! encode any number of documents against it.

use crate::binding::Accessor;
use crate::decode;
use crate::encode;
use crate::error::Result;
use crate::schema::{self, Schema};
use crate::value::Object;
use yamlbind_tree::{CodecOptions, Node, ParseMode, parse_lines, parse_named, parse_with};

/// A compiled schema plus the options every call runs with.
///
/// A `Codec` holds no per-call state: anchors, the instance path and the
/// output buffer live in the call that needs them. It can be shared
/// between threads freely.
///
/// # Example
///
/// ```rust
/// use yamlbind::{Codec, DynamicAccessor, Object, PrimitiveArray};
///
/// let codec = Codec::new(
///     "---\nproperties:\n  name: string\n  tags:\n    type: array\n    items: string[]\n",
/// )
/// .unwrap();
///
/// let person = Object::new("Person")
///     .with("name", "Alice")
///     .with("tags", PrimitiveArray::from(["a", "b"]));
/// let text = codec.encode(&person, &DynamicAccessor).unwrap();
/// assert_eq!(text, "---\nname: \"Alice\"\ntags:\n  - a\n  - b\n...");
///
/// let decoded = codec.decode(&text, "Person", &DynamicAccessor).unwrap();
/// assert_eq!(decoded, person);
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    schema: Schema,
    options: CodecOptions,
}

impl Codec {
    /// Compile schema text with default options.
    pub fn new(schema_text: &str) -> Result<Self> {
        Self::with_options(schema_text, CodecOptions::default())
    }

    /// Compile schema text with explicit options.
    pub fn with_options(schema_text: &str, options: CodecOptions) -> Result<Self> {
        options.validate()?;
        let document = parse_with(schema_text, &options, ParseMode::Schema)?;
        Self::from_tree_with_options(&document, options)
    }

    /// Compile a schema from a pre-built tree.
    pub fn from_tree(document: &Node) -> Result<Self> {
        Self::from_tree_with_options(document, CodecOptions::default())
    }

    pub fn from_tree_with_options(document: &Node, options: CodecOptions) -> Result<Self> {
        options.validate()?;
        let schema = schema::compile(document, &options)?;
        Ok(Self { schema, options })
    }

    /// Compile schema text read from `filename`; locations carry the name.
    pub(crate) fn from_named(schema_text: &str, filename: &str, options: CodecOptions) -> Result<Self> {
        options.validate()?;
        let document = parse_named(schema_text, filename, &options, ParseMode::Schema)?;
        Self::from_tree_with_options(&document, options)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Parse a data document into a tree, with this codec's options.
    pub fn parse(&self, text: &str) -> Result<Node> {
        Ok(parse_with(text, &self.options, ParseMode::Data)?)
    }

    /// Check a document against the schema.
    ///
    /// # Errors
    ///
    /// Structural errors for malformed text, validation errors for data
    /// that does not satisfy the schema.
    pub fn validate(&self, text: &str) -> Result<()> {
        self.validate_tree(&self.parse(text)?)
    }

    /// Check pre-split raw lines against the schema.
    pub fn validate_lines(&self, lines: &[&str]) -> Result<()> {
        let document = parse_lines(lines, &self.options, ParseMode::Data)?;
        self.validate_tree(&document)
    }

    /// Check an already parsed data tree against the schema.
    pub fn validate_tree(&self, document: &Node) -> Result<()> {
        decode::validate(&self.schema, document, &self.options)
    }

    /// Decode a document into an instance of `root_class`.
    pub fn decode(&self, text: &str, root_class: &str, accessor: &dyn Accessor) -> Result<Object> {
        self.decode_tree(&self.parse(text)?, root_class, accessor)
    }

    /// Decode an already parsed data tree.
    pub fn decode_tree(&self, document: &Node, root_class: &str, accessor: &dyn Accessor) -> Result<Object> {
        decode::decode(&self.schema, document, root_class, accessor, &self.options)
    }

    /// Encode a bound object as document text.
    ///
    /// The text starts with `---`, ends with `...` and has no trailing
    /// line break.
    pub fn encode(&self, object: &Object, accessor: &dyn Accessor) -> Result<String> {
        encode::encode(&self.schema, object, accessor, &self.options)
    }
}
