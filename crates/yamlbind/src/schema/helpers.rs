//! Helper functions for reading schema keyword values
//!
//! This module contains utility functions for extracting typed values from
//! keyword entries of a parsed schema document, with proper error handling.

use crate::error::{Error, Result};
use crate::restriction::Pattern;
use crate::schema::SchemaType;
use yamlbind_tree::{Node, SourceInfo, ValueType, split_flow_items, unescape};

fn invalid(node: &Node, message: String) -> Error {
    Error::structural(message, Some(node.source_info.clone()))
}

/// Get the scalar text of a keyword entry
pub(super) fn scalar_text<'a>(node: &'a Node, keyword: &str) -> Result<&'a str> {
    match &node.scalar {
        Some(scalar) => Ok(scalar.text.as_str()),
        _ => Err(invalid(node, format!("Field '{}' must be a scalar", keyword))),
    }
}

/// Get a number value of a keyword entry
pub(super) fn number(node: &Node, keyword: &str) -> Result<f64> {
    let text = scalar_text(node, keyword)?;
    match node.value_type() {
        ValueType::Integer | ValueType::Number => text
            .parse::<f64>()
            .map_err(|_| invalid(node, format!("Field '{}' must be a number", keyword))),
        _ => Err(invalid(node, format!("Field '{}' must be a number", keyword))),
    }
}

/// Get a non-negative integer value of a keyword entry
pub(super) fn count(node: &Node, keyword: &str) -> Result<usize> {
    let text = scalar_text(node, keyword)?;
    if node.value_type() == ValueType::Integer
        && let Ok(n) = text.trim_start_matches('+').parse::<usize>()
    {
        return Ok(n);
    }
    Err(invalid(
        node,
        format!("Field '{}' must be a non-negative integer", keyword),
    ))
}

/// Compile a `pattern` operand
pub(super) fn pattern(node: &Node) -> Result<Pattern> {
    let text = scalar_text(node, "pattern")?;
    Pattern::new(text).map_err(|e| invalid(node, format!("Invalid pattern '{}': {}", text, e)))
}

/// A parsed `type` value: the declared type and whether a `[]` suffix was present
pub(super) fn type_name(node: &Node) -> Result<(SchemaType, bool)> {
    let text = scalar_text(node, "type")?.trim();
    let (name, primitive) = match text.strip_suffix("[]") {
        Some(name) => (name.trim_end(), true),
        None => (text, false),
    };
    let schema_type = SchemaType::from_name(name)
        .ok_or_else(|| invalid(node, format!("Invalid schema type: {}", name)))?;
    if primitive && !schema_type.is_scalar() {
        return Err(invalid(
            node,
            format!("Only scalar types can carry the `[]` suffix, got '{}'", text),
        ));
    }
    Ok((schema_type, primitive))
}

/// Split a `mapping` value into `(member, container)`
///
/// `"field:Container"` names both; a bare value names only the container.
pub(super) fn mapping(node: &Node) -> Result<(Option<String>, String)> {
    let text = scalar_text(node, "mapping")?.trim();
    let (member, container) = match text.split_once(':') {
        Some((member, container)) => (Some(member.trim()), container.trim()),
        None => (None, text),
    };
    if container.is_empty() || member.is_some_and(str::is_empty) {
        return Err(invalid(
            node,
            format!("Field 'mapping' must be `member:Container` or `Container`, got '{}'", text),
        ));
    }
    Ok((member.map(str::to_string), container.to_string()))
}

/// Names listed in a `required` entry, as a block sequence or an inline `[a, b]`
pub(super) fn name_list(
    node: &Node,
    keyword: &str,
    quote: char,
) -> Result<Vec<(String, SourceInfo)>> {
    if node.is_sequence() {
        return node
            .items()
            .map(|item| {
                let name = scalar_text(item, keyword)?;
                Ok((name.to_string(), item.source_info.clone()))
            })
            .collect();
    }
    if let Some(scalar) = &node.scalar
        && !scalar.quoted
        && node.value_type() == ValueType::Array
    {
        let text = scalar.text.trim();
        let inner = &text[1..text.len() - 1];
        return Ok(split_flow_items(inner, quote)
            .into_iter()
            .map(|part| (unquote(part, quote), node.source_info.clone()))
            .collect());
    }
    Err(invalid(
        node,
        format!("Field '{}' must be a list of property names", keyword),
    ))
}

/// `*name` reference text, if the scalar is one
pub(super) fn reference_name(node: &Node) -> Option<&str> {
    let scalar = node.scalar.as_ref()?;
    if scalar.quoted {
        return None;
    }
    scalar
        .text
        .strip_prefix('*')
        .filter(|name| !name.is_empty())
}

/// Strip surrounding quotes from a flow item
pub(super) fn unquote(part: &str, quote: char) -> String {
    let part = part.trim();
    if part.len() >= 2 && part.starts_with(quote) && part.ends_with(quote) {
        unescape(&part[1..part.len() - 1], quote)
    } else {
        part.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yamlbind_tree::Scalar;

    fn entry(key: &str, text: &str) -> Node {
        Node::entry(key, 1, Scalar::plain(text))
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(&entry("type", "string")).unwrap(), (SchemaType::String, false));
        assert_eq!(type_name(&entry("type", "integer[]")).unwrap(), (SchemaType::Integer, true));
        assert!(type_name(&entry("type", "object[]")).is_err());
        assert!(type_name(&entry("type", "text")).is_err());
    }

    #[test]
    fn test_mapping() {
        assert_eq!(
            mapping(&entry("mapping", "full_name:Person")).unwrap(),
            (Some("full_name".into()), "Person".into())
        );
        assert_eq!(mapping(&entry("mapping", "Person")).unwrap(), (None, "Person".into()));
        assert!(mapping(&entry("mapping", ":Person")).is_err());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number(&entry("minimum", "-1.5"), "minimum").unwrap(), -1.5);
        assert_eq!(count(&entry("minItems", "2"), "minItems").unwrap(), 2);
        assert!(count(&entry("minItems", "-2"), "minItems").is_err());
        assert!(number(&entry("minimum", "ten"), "minimum").is_err());
    }

    #[test]
    fn test_flow_name_list() {
        let names: Vec<String> = name_list(&entry("required", "[name, \"age\"]"), "required", '"')
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["name", "age"]);
    }

    #[test]
    fn test_reference_name() {
        assert_eq!(reference_name(&entry("items", "*tag")), Some("tag"));
        assert_eq!(reference_name(&Node::entry("x", 1, Scalar::quoted("*tag"))), None);
    }
}
