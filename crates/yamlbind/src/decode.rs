//! Decoder and validator: compiled schema x parsed data tree.
//!
//! Both walk the same way. With an accessor the walk constructs and binds
//! objects; without one it only asserts, so a document that validates is
//! exactly a document that decodes (up to binding failures).

use crate::binding::Accessor;
use crate::error::{BindingError, Error, InstancePath, Result, ValidationError, ValidationErrorKind};
use crate::format::{self, ScalarError};
use crate::restriction::{self, CheckError};
use crate::schema::{Schema, SchemaId, SchemaType};
use crate::value::{Object, PrimitiveArray, Value};
use yamlbind_tree::{CodecOptions, Node, NodeKind, Scalar, SourceInfo, ValueType, split_flow_items, unescape};

/// Decode a parsed data document into an instance of `root_class`.
pub fn decode(
    schema: &Schema,
    document: &Node,
    root_class: &str,
    accessor: &dyn Accessor,
    options: &CodecOptions,
) -> Result<Object> {
    tracing::debug!(class = root_class, "decoding document");
    let mut walker = Walker::new(schema, Some(accessor), options);
    let mut object = accessor.construct(root_class)?;
    walker.members(schema.root(), document, Some(&mut object), 1)?;
    Ok(object)
}

/// Check a parsed data document against `schema` without binding anything.
pub fn validate(schema: &Schema, document: &Node, options: &CodecOptions) -> Result<()> {
    tracing::debug!("validating document");
    let mut walker = Walker::new(schema, None, options);
    walker.members(schema.root(), document, None, 1)
}

struct Walker<'a> {
    schema: &'a Schema,
    accessor: Option<&'a dyn Accessor>,
    options: &'a CodecOptions,
    path: InstancePath,
}

/// `key:` with nothing under it, or an unquoted `null`.
fn is_absent(node: &Node) -> bool {
    node.is_empty() || node.scalar.as_ref().is_some_and(Scalar::is_null_literal)
}

impl<'a> Walker<'a> {
    fn new(schema: &'a Schema, accessor: Option<&'a dyn Accessor>, options: &'a CodecOptions) -> Self {
        Self {
            schema,
            accessor,
            options,
            path: InstancePath::new(),
        }
    }

    /// Match the entries of `data` against the properties of `object_id`.
    fn members(
        &mut self,
        object_id: SchemaId,
        data: &Node,
        mut object: Option<&mut Object>,
        depth: usize,
    ) -> Result<()> {
        self.check_depth(depth, &data.source_info)?;
        let schema = self.schema;
        for entry in data.children.iter().filter(|c| c.kind == NodeKind::Entry) {
            if schema.find_child(object_id, &entry.name).is_none() {
                tracing::debug!(key = %entry.name, at = %entry.source_info, "skipping key with no schema property");
            }
        }

        let owner = schema.container(object_id);
        for &child in schema.children(object_id) {
            let node = schema.node(child);
            let value = self.member(child, data, owner, depth)?;
            if let (Some(object), Some(value)) = (object.as_deref_mut(), value)
                && let Some(accessor) = self.accessor
            {
                accessor.set(object, node.member_name(), value)?;
            }
        }
        Ok(())
    }

    /// Decode one property. `None` when the data has nothing for it.
    fn member(&mut self, id: SchemaId, parent: &Node, owner: &str, depth: usize) -> Result<Option<Value>> {
        let schema = self.schema;
        let node = schema.node(id);
        let data = parent.get(&node.name);
        self.path.push_key(node.name.as_str());

        let data = match data {
            Some(data) if !is_absent(data) => data,
            absent => {
                if node.required {
                    let (kind, location) = match absent {
                        None => (
                            ValidationErrorKind::MissingRequiredProperty {
                                property: node.name.clone(),
                            },
                            &parent.source_info,
                        ),
                        Some(data) => (
                            ValidationErrorKind::RequiredValueEmpty {
                                property: node.name.clone(),
                            },
                            &data.source_info,
                        ),
                    };
                    return Err(self.invalid(kind, location));
                }
                self.path.pop();
                return Ok(None);
            }
        };

        tracing::trace!(name = %node.name, at = %data.source_info, "decoding member");
        let value = self.value(id, data, owner, depth)?;
        self.path.pop();
        Ok(Some(value))
    }

    /// Decode a present, non-null data node under schema node `id`.
    fn value(&mut self, id: SchemaId, data: &Node, owner: &str, depth: usize) -> Result<Value> {
        match self.declared_type(id)? {
            SchemaType::Object => {
                self.expect_type(SchemaType::Object, data)?;
                self.object(id, data, depth + 1)
            }
            SchemaType::Array => self.array(id, data, owner, depth),
            scalar => self.leaf(id, scalar, data, owner),
        }
    }

    fn object(&mut self, id: SchemaId, data: &Node, depth: usize) -> Result<Value> {
        match self.accessor {
            Some(accessor) => {
                let mut object = accessor.construct(self.schema.container(id))?;
                self.members(id, data, Some(&mut object), depth)?;
                Ok(Value::Object(object))
            }
            None => {
                self.members(id, data, None, depth)?;
                Ok(Value::Null)
            }
        }
    }

    fn array(&mut self, id: SchemaId, data: &Node, owner: &str, depth: usize) -> Result<Value> {
        let schema = self.schema;
        let node = schema.node(id);
        let elements = self.elements(data)?;

        let restrictions = &schema.node(schema.target(id)).restrictions;
        restriction::check_count(elements.len(), restrictions)
            .map_err(|e| self.check_error(e, &data.source_info))?;

        let items = schema.items(id).ok_or_else(|| {
            Error::structural(
                format!("Array schema '{}' has no items", node.name),
                Some(node.source_info.clone()),
            )
        })?;
        let items_type = self.declared_type(items)?;
        if items_type == SchemaType::Array {
            return Err(Error::structural(
                "Nested arrays are not supported",
                Some(data.source_info.clone()),
            ));
        }

        let mut values = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            self.path.push_index(index);
            let value = if is_absent(element) {
                Value::Null
            } else if items_type == SchemaType::Object {
                self.expect_type(SchemaType::Object, element)?;
                self.object(items, element, depth + 1)?
            } else {
                self.leaf(items, items_type, element, owner)?
            };
            values.push(value);
            self.path.pop();
        }

        if self.accessor.is_none() {
            return Ok(Value::Null);
        }
        match items_type.scalar_kind() {
            Some(kind) if schema.node(items).primitive_array => PrimitiveArray::from_values(kind, values)
                .map(Value::Array)
                .map_err(|got| {
                    BindingError::UnsupportedType {
                        class: owner.to_string(),
                        member: node.member_name().to_string(),
                        expected: format!("{}[]", kind),
                        got: got.to_string(),
                    }
                    .into()
                }),
            _ => Ok(Value::List(values)),
        }
    }

    /// Elements of an array node: block sequence items, or the parts of an
    /// inline `[a, b]` turned into item nodes.
    fn elements(&self, data: &Node) -> Result<Vec<Node>> {
        if data.is_sequence() {
            return Ok(data.items().cloned().collect());
        }
        let inline = data
            .scalar
            .as_ref()
            .filter(|s| !s.quoted && s.value_type() == ValueType::Array);
        let Some(scalar) = inline else {
            return Err(self.mismatch(SchemaType::Array, data));
        };

        let text = scalar.text.trim();
        let quote = self.options.quote;
        Ok(split_flow_items(&text[1..text.len() - 1], quote)
            .into_iter()
            .map(|part| {
                let mut item = Node::new("", data.level + 1, NodeKind::SequenceItem, data.source_info.clone());
                if part.len() >= 2 && part.starts_with(quote) && part.ends_with(quote) {
                    item.scalar = Some(Scalar::quoted(unescape(&part[1..part.len() - 1], quote)));
                } else if !part.is_empty() {
                    item.scalar = Some(Scalar::plain(part));
                }
                item
            })
            .collect())
    }

    fn leaf(&mut self, id: SchemaId, declared: SchemaType, data: &Node, owner: &str) -> Result<Value> {
        let Some(scalar) = data.scalar.as_ref() else {
            return Err(self.mismatch(declared, data));
        };
        if !declared.accepts(scalar.value_type()) {
            return Err(self.mismatch(declared, data));
        }

        let schema = self.schema;
        let node = schema.node(id);
        if node.required && scalar.text.is_empty() {
            return Err(self.invalid(
                ValidationErrorKind::RequiredValueEmpty {
                    property: node.name.clone(),
                },
                &data.source_info,
            ));
        }

        let restrictions = &schema.node(schema.target(id)).restrictions;
        restriction::check_all(&scalar.text, restrictions, declared)
            .map_err(|e| self.check_error(e, &data.source_info))?;

        if self.accessor.is_none() {
            return Ok(Value::Null);
        }
        format::text_to_value(scalar, declared).map_err(|err| match err {
            ScalarError::Mismatch { expected, got } => self.invalid(
                ValidationErrorKind::TypeMismatch {
                    expected: expected.to_string(),
                    got: got.to_string(),
                },
                &data.source_info,
            ),
            ScalarError::NonFinite(n) => self.invalid(
                ValidationErrorKind::NonFiniteNumber {
                    value: n.to_string(),
                },
                &data.source_info,
            ),
            ScalarError::Unsupported(declared) => Error::structural(
                format!(
                    "Type {} of '{}' (in {}) has no scalar form",
                    declared, node.name, owner
                ),
                Some(node.source_info.clone()),
            ),
        })
    }

    fn expect_type(&self, declared: SchemaType, data: &Node) -> Result<()> {
        if declared.accepts(data.value_type()) {
            Ok(())
        } else {
            Err(self.mismatch(declared, data))
        }
    }

    fn declared_type(&self, id: SchemaId) -> Result<SchemaType> {
        let node = self.schema.node(id);
        self.schema.effective_type(id).ok_or_else(|| {
            Error::structural(
                format!("Schema node '{}' has neither a type nor a reference", node.name),
                Some(node.source_info.clone()),
            )
        })
    }

    fn check_depth(&self, depth: usize, location: &SourceInfo) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::structural(
                format!("Nesting exceeds the maximum depth of {}", self.options.max_depth),
                Some(location.clone()),
            ));
        }
        Ok(())
    }

    fn mismatch(&self, declared: SchemaType, data: &Node) -> Error {
        self.invalid(
            ValidationErrorKind::TypeMismatch {
                expected: declared.to_string(),
                got: data.value_type().to_string(),
            },
            &data.source_info,
        )
    }

    fn invalid(&self, kind: ValidationErrorKind, location: &SourceInfo) -> Error {
        ValidationError::new(kind, self.path.clone())
            .with_location(location.clone())
            .into()
    }

    fn check_error(&self, err: CheckError, location: &SourceInfo) -> Error {
        match err {
            CheckError::Violation(kind) => self.invalid(kind, location),
            misconfigured => Error::structural(misconfigured.message(), Some(location.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::DynamicAccessor;
    use crate::error::PathSegment;
    use crate::schema::compile;
    use yamlbind_tree::{ParseMode, parse_with};

    const SCHEMA: &str = r#"---
properties:
  name:
    type: string
    minLength: 1
  age:
    type: integer
    minimum: 0
  tags:
    type: array
    items: string[]
  home:
    type: object
    mapping: "address:Address"
    properties:
      city: string
required: [name]
"#;

    fn schema() -> Schema {
        let options = CodecOptions::default();
        compile(&parse_with(SCHEMA, &options, ParseMode::Schema).unwrap(), &options).unwrap()
    }

    fn data(text: &str) -> Node {
        parse_with(text, &CodecOptions::default(), ParseMode::Data).unwrap()
    }

    fn decode_text(text: &str) -> Result<Object> {
        decode(&schema(), &data(text), "Person", &DynamicAccessor, &CodecOptions::default())
    }

    fn validate_text(text: &str) -> Result<()> {
        validate(&schema(), &data(text), &CodecOptions::default())
    }

    #[test]
    fn test_decode_all_shapes() {
        let person = decode_text("---\nname: Alice\nage: 30\ntags: [a, \"b c\"]\nhome:\n  city: Oslo\n").unwrap();
        assert_eq!(person.class, "Person");
        assert_eq!(person.get("name"), Some(&Value::from("Alice")));
        assert_eq!(person.get("age"), Some(&Value::Integer(30)));
        assert_eq!(person.get("tags"), Some(&Value::Array(PrimitiveArray::from(["a", "b c"]))));

        let home = person.get("address").and_then(Value::as_object).unwrap();
        assert_eq!(home.class, "Address");
        assert_eq!(home.get("city"), Some(&Value::from("Oslo")));
    }

    #[test]
    fn test_absent_and_null_members_are_not_set() {
        let person = decode_text("---\nname: Alice\nage: null\nhome:\n").unwrap();
        assert_eq!(person.get("age"), None);
        assert_eq!(person.get("address"), None);
    }

    #[test]
    fn test_missing_required() {
        let err = validate_text("---\nage: 3\n").unwrap_err();
        assert_eq!(err.error_code(), "Y-1-10");
        let err = validate_text("---\nname: null\n").unwrap_err();
        assert_eq!(err.error_code(), "Y-1-12");
        let err = validate_text("---\nname: \"\"\n").unwrap_err();
        assert_eq!(err.error_code(), "Y-1-12");
    }

    #[test]
    fn test_type_mismatch_points_at_data() {
        let err = validate_text("---\nname: Bob\nage: old\n").unwrap_err();
        let Error::Validation(err) = err else {
            panic!("expected a validation error");
        };
        assert!(matches!(err.kind, ValidationErrorKind::TypeMismatch { .. }));
        assert_eq!(err.location.as_ref().unwrap().line, 3);
        assert_eq!(err.instance_path.segments(), &[PathSegment::Key("age".into())]);
    }

    #[test]
    fn test_quoted_number_is_a_string() {
        assert!(validate_text("---\nname: Bob\nage: \"3\"\n").is_err());
        assert!(validate_text("---\nname: \"3\"\n").is_ok());
    }

    #[test]
    fn test_restriction_violation() {
        let err = validate_text("---\nname: Bob\nage: -1\n").unwrap_err();
        assert_eq!(err.error_code(), "Y-1-15");
    }

    #[test]
    fn test_element_type_checked() {
        let err = validate_text("---\nname: Bob\ntags:\n  - a\n  - 7\n").unwrap_err();
        let Error::Validation(err) = err else {
            panic!("expected a validation error");
        };
        assert_eq!(err.instance_path.to_string(), "tags.[1]");
    }

    #[test]
    fn test_null_elements() {
        let person = decode_text("---\nname: Bob\ntags:\n  - a\n  - null\n").unwrap();
        assert_eq!(
            person.get("tags"),
            Some(&Value::Array(PrimitiveArray::String(Box::new([Some("a".into()), None]))))
        );
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        assert!(validate_text("---\nname: Bob\nnickname: B\n").is_ok());
    }

    #[test]
    fn test_validate_binds_nothing() {
        assert!(validate_text("---\nname: Alice\ntags: []\nhome:\n  city: Oslo\n").is_ok());
    }
}
