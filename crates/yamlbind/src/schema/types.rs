//! Compiled schema: an arena of typed nodes plus the `definitions` registry.

use crate::restriction::Restriction;
use crate::value::ScalarKind;
use indexmap::IndexMap;
use std::fmt;
use yamlbind_tree::{SourceInfo, ValueType};

/// Declared type of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => SchemaType::String,
            "number" => SchemaType::Number,
            "integer" => SchemaType::Integer,
            "boolean" => SchemaType::Boolean,
            "array" => SchemaType::Array,
            "object" => SchemaType::Object,
            "null" => SchemaType::Null,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Null => "null",
        }
    }

    /// A leaf type: anything but array and object.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, SchemaType::Array | SchemaType::Object)
    }

    /// Scalar kind carried by primitive arrays of this type.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            SchemaType::String => Some(ScalarKind::String),
            SchemaType::Number => Some(ScalarKind::Number),
            SchemaType::Integer => Some(ScalarKind::Integer),
            SchemaType::Boolean => Some(ScalarKind::Boolean),
            _ => None,
        }
    }

    /// Whether data text of lexical type `lexical` fits this declared type.
    /// Integers are accepted where numbers are declared.
    pub fn accepts(&self, lexical: ValueType) -> bool {
        matches!(
            (self, lexical),
            (SchemaType::String, ValueType::String)
                | (SchemaType::Number, ValueType::Number | ValueType::Integer)
                | (SchemaType::Integer, ValueType::Integer)
                | (SchemaType::Boolean, ValueType::Boolean)
                | (SchemaType::Array, ValueType::Array)
                | (SchemaType::Object, ValueType::Object)
                | (SchemaType::Null, ValueType::Null)
        )
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of a node in its [`Schema`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A compiled schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub name: String,
    pub level: usize,
    /// `None` for pure reference nodes and not-yet-typed placeholders
    pub schema_type: Option<SchemaType>,
    /// Elements of this `items` node bind to a fixed-size native array
    pub primitive_array: bool,
    pub description: Option<String>,
    pub default: Option<String>,
    /// Bound member name; defaults to `name`
    pub member: Option<String>,
    /// Class identity constructed for object nodes
    pub container: Option<String>,
    pub required: bool,
    /// Link into `definitions`
    pub reference: Option<SchemaId>,
    pub restrictions: Vec<Restriction>,
    pub children: Vec<SchemaId>,
    pub source_info: SourceInfo,
}

impl SchemaNode {
    pub(crate) fn new(name: impl Into<String>, level: usize, source_info: SourceInfo) -> Self {
        Self {
            name: name.into(),
            level,
            schema_type: None,
            primitive_array: false,
            description: None,
            default: None,
            member: None,
            container: None,
            required: false,
            reference: None,
            restrictions: Vec::new(),
            children: Vec::new(),
            source_info,
        }
    }

    /// Member name this node binds to.
    pub fn member_name(&self) -> &str {
        self.member.as_deref().unwrap_or(&self.name)
    }
}

/// A compiled schema document.
///
/// References are arena indices, so cycles among definitions are fine.
/// Built once, then shared read-only by any number of codec calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) root: SchemaId,
    pub(crate) definitions: IndexMap<String, SchemaId>,
}

impl Schema {
    pub fn root(&self) -> SchemaId {
        self.root
    }

    pub fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a definition by name.
    pub fn definition(&self, name: &str) -> Option<SchemaId> {
        self.definitions.get(name).copied()
    }

    /// Definition names with their ids, in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = (&str, SchemaId)> {
        self.definitions.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Follow pure reference nodes (no declared type) to the node that
    /// carries the type.
    pub fn target(&self, id: SchemaId) -> SchemaId {
        let mut current = id;
        // Reference chains are checked for cycles at compile time; the step
        // bound keeps a hand-built arena from looping.
        for _ in 0..self.nodes.len() {
            let node = self.node(current);
            match (node.schema_type, node.reference) {
                (None, Some(next)) => current = next,
                _ => break,
            }
        }
        current
    }

    /// Declared type after following references.
    pub fn effective_type(&self, id: SchemaId) -> Option<SchemaType> {
        self.node(self.target(id)).schema_type
    }

    /// Properties of an object node: its own children, or the children of
    /// the node its `properties` reference points at.
    pub fn children(&self, id: SchemaId) -> &[SchemaId] {
        let mut current = self.target(id);
        for _ in 0..self.nodes.len() {
            let node = self.node(current);
            if !node.children.is_empty() {
                return &node.children;
            }
            match node.reference {
                Some(next) => current = self.target(next),
                None => break,
            }
        }
        &[]
    }

    /// Find a property by name.
    pub fn find_child(&self, id: SchemaId, name: &str) -> Option<SchemaId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.node(*child).name == name)
    }

    /// The `items` node of an array node.
    pub fn items(&self, id: SchemaId) -> Option<SchemaId> {
        self.children(id).first().copied()
    }

    /// Class identity constructed for an object node.
    ///
    /// Defaults to the referenced definition's container (or name) for
    /// reference nodes, and to the node's own name otherwise.
    pub fn container(&self, id: SchemaId) -> &str {
        let mut current = id;
        for _ in 0..self.nodes.len() {
            let node = self.node(current);
            if let Some(container) = &node.container {
                return container;
            }
            match node.reference {
                Some(next) => current = next,
                None => return &node.name,
            }
        }
        &self.node(id).name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Schema {
        // 0: root, 1: definition "address", 2: address.street, 3: root.home -> *address
        let mut root = SchemaNode::new("", 0, SourceInfo::default());
        root.schema_type = Some(SchemaType::Object);
        root.children = vec![SchemaId(3)];

        let mut address = SchemaNode::new("address", 1, SourceInfo::default());
        address.schema_type = Some(SchemaType::Object);
        address.container = Some("Address".into());
        address.children = vec![SchemaId(2)];

        let mut street = SchemaNode::new("street", 2, SourceInfo::default());
        street.schema_type = Some(SchemaType::String);

        let mut home = SchemaNode::new("home", 1, SourceInfo::default());
        home.reference = Some(SchemaId(1));

        let mut definitions = IndexMap::new();
        definitions.insert("address".to_string(), SchemaId(1));
        Schema {
            nodes: vec![root, address, street, home],
            root: SchemaId(0),
            definitions,
        }
    }

    #[test]
    fn test_reference_resolution() {
        let schema = arena();
        let home = schema.find_child(schema.root(), "home").unwrap();
        assert_eq!(schema.target(home), SchemaId(1));
        assert_eq!(schema.effective_type(home), Some(SchemaType::Object));
        assert_eq!(schema.container(home), "Address");
        assert_eq!(schema.node(home).member_name(), "home");
        assert_eq!(schema.find_child(home, "street"), Some(SchemaId(2)));
    }

    #[test]
    fn test_accepts_integer_as_number() {
        assert!(SchemaType::Number.accepts(ValueType::Integer));
        assert!(!SchemaType::Integer.accepts(ValueType::Number));
        assert!(!SchemaType::String.accepts(ValueType::Integer));
    }
}
