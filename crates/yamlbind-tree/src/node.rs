//! Generic node tree produced by the line parser.

use crate::SourceInfo;
use crate::classify::{ValueType, classify};
use serde::Serialize;

/// What a node stands for in the document layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// The document root (level 0).
    Document,
    /// A `key: value` entry.
    Entry,
    /// One `- ...` slot of a block sequence. Consecutive slots of the
    /// same sequence are siblings under the owning entry.
    SequenceItem,
}

/// Scalar text of a node.
///
/// Surrounding quotes are stripped while parsing; `quoted` remembers that
/// they were there so that `"null"` or `"7"` keep their string meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scalar {
    pub text: String,
    pub quoted: bool,
}

impl Scalar {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }

    /// Lexical type: quoted text is always a string.
    pub fn value_type(&self) -> ValueType {
        if self.quoted {
            ValueType::String
        } else {
            classify(&self.text)
        }
    }

    /// Unquoted `null`, case-insensitively.
    pub fn is_null_literal(&self) -> bool {
        !self.quoted && self.text.trim().eq_ignore_ascii_case("null")
    }
}

/// A node of a parsed document.
///
/// A node holds either a scalar or children, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    pub level: usize,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalar: Option<Scalar>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    pub source_info: SourceInfo,
}

impl Node {
    pub fn new(name: impl Into<String>, level: usize, kind: NodeKind, source_info: SourceInfo) -> Self {
        Self {
            name: name.into(),
            level,
            kind,
            scalar: None,
            children: Vec::new(),
            source_info,
        }
    }

    /// Build a scalar entry, mostly useful in tests and for pre-built schema trees.
    pub fn entry(name: impl Into<String>, level: usize, scalar: Scalar) -> Self {
        let mut node = Self::new(name, level, NodeKind::Entry, SourceInfo::default());
        node.scalar = Some(scalar);
        node
    }

    /// Build an entry with children.
    pub fn mapping(name: impl Into<String>, level: usize, children: Vec<Node>) -> Self {
        let mut node = Self::new(name, level, NodeKind::Entry, SourceInfo::default());
        node.children = children;
        node
    }

    pub fn is_scalar(&self) -> bool {
        self.scalar.is_some()
    }

    /// No scalar and no children.
    pub fn is_empty(&self) -> bool {
        self.scalar.is_none() && self.children.is_empty()
    }

    /// Children form a block sequence.
    pub fn is_sequence(&self) -> bool {
        !self.children.is_empty()
            && self
                .children
                .iter()
                .all(|c| c.kind == NodeKind::SequenceItem)
    }

    pub fn is_sequence_item(&self) -> bool {
        self.kind == NodeKind::SequenceItem
    }

    pub fn text(&self) -> Option<&str> {
        self.scalar.as_ref().map(|s| s.text.as_str())
    }

    /// Lexical type of this node's content.
    ///
    /// Nodes with children are `Array` (block sequence) or `Object`.
    pub fn value_type(&self) -> ValueType {
        match &self.scalar {
            Some(scalar) => scalar.value_type(),
            None if self.is_sequence() => ValueType::Array,
            None if !self.children.is_empty() => ValueType::Object,
            None => ValueType::Null,
        }
    }

    /// Find a named child entry.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| c.kind == NodeKind::Entry && c.name == name)
    }

    /// Sequence items of this node, in document order.
    pub fn items(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|c| c.is_sequence_item())
    }

    /// Copy of this node's content (scalar and children) re-rooted at a
    /// new name and level. Used to expand aliases.
    pub(crate) fn rebased(&self, name: &str, level: usize, kind: NodeKind, source_info: SourceInfo) -> Node {
        let mut copy = Node::new(name, level, kind, source_info);
        copy.scalar = self.scalar.clone();
        copy.children = self
            .children
            .iter()
            .map(|c| c.rebased(&c.name, level + 1, c.kind, c.source_info.clone()))
            .collect();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str) -> Node {
        let mut node = Node::new("", 2, NodeKind::SequenceItem, SourceInfo::default());
        node.scalar = Some(Scalar::plain(text));
        node
    }

    #[test]
    fn test_scalar_value_type() {
        assert_eq!(Scalar::plain("7").value_type(), ValueType::Integer);
        assert_eq!(Scalar::quoted("7").value_type(), ValueType::String);
        assert!(Scalar::plain("Null").is_null_literal());
        assert!(!Scalar::quoted("null").is_null_literal());
    }

    #[test]
    fn test_sequence_detection() {
        let tags = Node::mapping("tags", 1, vec![item("a"), item("b")]);
        assert!(tags.is_sequence());
        assert_eq!(tags.items().count(), 2);
        assert_eq!(tags.value_type(), ValueType::Array);

        let person = Node::mapping("person", 1, vec![Node::entry("name", 2, Scalar::plain("x"))]);
        assert!(!person.is_sequence());
        assert_eq!(person.value_type(), ValueType::Object);
        assert_eq!(person.get("name").and_then(|n| n.text()), Some("x"));
    }

    #[test]
    fn test_empty_node() {
        let node = Node::new("x", 1, NodeKind::Entry, SourceInfo::default());
        assert!(node.is_empty());
        assert_eq!(node.value_type(), ValueType::Null);
    }

    #[test]
    fn test_rebased_adjusts_levels() {
        let src = Node::mapping("a", 1, vec![Node::entry("b", 2, Scalar::plain("1"))]);
        let copy = src.rebased("c", 3, NodeKind::Entry, SourceInfo::default());
        assert_eq!(copy.name, "c");
        assert_eq!(copy.level, 3);
        assert_eq!(copy.children[0].level, 4);
        assert_eq!(copy.children[0].name, "b");
    }
}
