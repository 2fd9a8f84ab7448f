//! Encoder: compiled schema x bound object to document text.

use crate::binding::Accessor;
use crate::error::{BindingError, Error, InstancePath, Result, ValidationError, ValidationErrorKind};
use crate::format::{self, ScalarError};
use crate::restriction::{self, CheckError};
use crate::schema::{Schema, SchemaId, SchemaType};
use crate::value::{Object, Value};
use yamlbind_tree::CodecOptions;

/// Encode `object` as a document laid out by `schema`.
///
/// Every schema property is emitted in schema order. Strings under a key
/// are quoted, array entries sit half an indentation unit deeper than
/// their key and the document is framed by `---` and `...`.
pub fn encode(
    schema: &Schema,
    object: &Object,
    accessor: &dyn Accessor,
    options: &CodecOptions,
) -> Result<String> {
    tracing::debug!(class = %object.class, "encoding object");
    let mut encoder = Encoder {
        schema,
        accessor,
        options,
        lines: vec!["---".to_string()],
        path: InstancePath::new(),
    };
    encoder.members(schema.root(), object, 0, 1)?;
    encoder.lines.push("...".to_string());
    Ok(encoder.lines.join("\n"))
}

struct Encoder<'a> {
    schema: &'a Schema,
    accessor: &'a dyn Accessor,
    options: &'a CodecOptions,
    lines: Vec<String>,
    path: InstancePath,
}

impl Encoder<'_> {
    fn members(&mut self, object_id: SchemaId, object: &Object, column: usize, depth: usize) -> Result<()> {
        self.check_depth(depth)?;
        let schema = self.schema;
        for &child in schema.children(object_id) {
            self.member(child, object, column, depth)?;
        }
        Ok(())
    }

    fn member(&mut self, id: SchemaId, owner: &Object, column: usize, depth: usize) -> Result<()> {
        let schema = self.schema;
        let node = schema.node(id);
        let member = node.member_name();
        let value = self.accessor.get(owner, member)?;
        let schema_type = self.declared_type(id)?;
        tracing::trace!(name = %node.name, %schema_type, "encoding member");

        self.path.push_key(node.name.as_str());
        let indent = " ".repeat(column);
        match schema_type {
            SchemaType::Object => match value {
                Value::Null => {
                    self.check_present(id, value)?;
                    self.lines.push(format!("{}{}: null", indent, node.name));
                }
                Value::Object(child) => {
                    self.lines.push(format!("{}{}:", indent, node.name));
                    let width = self.options.indent_width;
                    self.members(id, child, column + width, depth + 1)?;
                }
                other => {
                    return Err(BindingError::NotAnObject {
                        member: member.to_string(),
                        got: other.kind_name().to_string(),
                    }
                    .into());
                }
            },
            SchemaType::Array => self.array(id, owner, value, column, depth)?,
            scalar => {
                self.check_present(id, value)?;
                let text = self.scalar(id, scalar, value, owner, member)?;
                let rendered = format::render(text.as_deref(), scalar, self.options.quote, false);
                self.lines.push(format!("{}{}: {}", indent, node.name, rendered));
            }
        }
        self.path.pop();
        Ok(())
    }

    fn array(
        &mut self,
        id: SchemaId,
        owner: &Object,
        value: &Value,
        column: usize,
        depth: usize,
    ) -> Result<()> {
        let schema = self.schema;
        let node = schema.node(id);
        let indent = " ".repeat(column);
        let staged;
        let elements: &[Value] = match value {
            Value::Null => {
                self.check_present(id, value)?;
                self.lines.push(format!("{}{}: null", indent, node.name));
                return Ok(());
            }
            Value::Array(array) => {
                staged = array.values();
                &staged
            }
            Value::List(list) => list,
            other => {
                return Err(BindingError::UnsupportedType {
                    class: owner.class.clone(),
                    member: node.member_name().to_string(),
                    expected: "array".to_string(),
                    got: other.kind_name().to_string(),
                }
                .into());
            }
        };

        let restrictions = &schema.node(schema.target(id)).restrictions;
        restriction::check_count(elements.len(), restrictions).map_err(|e| self.check_error(e))?;

        if elements.is_empty() {
            self.lines.push(format!("{}{}: []", indent, node.name));
            return Ok(());
        }

        let items = schema.items(id).ok_or_else(|| {
            Error::structural(format!("Array schema '{}' has no items", node.name), None)
        })?;
        let items_type = self.declared_type(items)?;
        self.lines.push(format!("{}{}:", indent, node.name));
        let dash = column + self.options.indent_width / 2;
        for (index, element) in elements.iter().enumerate() {
            self.path.push_index(index);
            self.element(items, items_type, element, owner, node.member_name(), dash, depth + 1)?;
            self.path.pop();
        }
        Ok(())
    }

    fn element(
        &mut self,
        items: SchemaId,
        items_type: SchemaType,
        element: &Value,
        owner: &Object,
        member: &str,
        dash: usize,
        depth: usize,
    ) -> Result<()> {
        let prefix = " ".repeat(dash);
        match (items_type, element) {
            (_, Value::Null) => self.lines.push(format!("{}- null", prefix)),
            (SchemaType::Object, Value::Object(child)) => {
                let start = self.lines.len();
                self.members(items, child, dash + 2, depth + 1)?;
                if start < self.lines.len() {
                    // The first member shares the dash line.
                    self.lines[start].replace_range(..dash + 2, &format!("{}- ", prefix));
                } else {
                    self.lines.push(format!("{}- null", prefix));
                }
            }
            (SchemaType::Object, other) => {
                return Err(BindingError::NotAnObject {
                    member: member.to_string(),
                    got: other.kind_name().to_string(),
                }
                .into());
            }
            (SchemaType::Array, _) => {
                return Err(Error::structural("Nested arrays are not supported", None));
            }
            (scalar, value) => {
                let text = self.scalar(items, scalar, value, owner, member)?;
                let rendered = format::render(text.as_deref(), scalar, self.options.quote, true);
                self.lines.push(format!("{}- {}", prefix, rendered));
            }
        }
        Ok(())
    }

    /// Format a leaf and check it against the node's restrictions.
    fn scalar(
        &self,
        id: SchemaId,
        schema_type: SchemaType,
        value: &Value,
        owner: &Object,
        member: &str,
    ) -> Result<Option<String>> {
        let text = format::scalar_text(value, schema_type).map_err(|err| match err {
            ScalarError::Mismatch { expected, got } => Error::Binding(BindingError::UnsupportedType {
                class: owner.class.clone(),
                member: member.to_string(),
                expected: expected.to_string(),
                got: got.to_string(),
            }),
            ScalarError::NonFinite(n) => self.invalid(ValidationErrorKind::NonFiniteNumber {
                value: n.to_string(),
            }),
            ScalarError::Unsupported(declared) => Error::structural(
                format!("Type {} has no scalar form", declared),
                None,
            ),
        })?;

        let node = self.schema.node(id);
        if node.required && text.as_deref() == Some("") {
            return Err(self.invalid(ValidationErrorKind::RequiredValueEmpty {
                property: node.name.clone(),
            }));
        }
        if let Some(text) = &text {
            let restrictions = &self.schema.node(self.schema.target(id)).restrictions;
            restriction::check_all(text, restrictions, schema_type).map_err(|e| self.check_error(e))?;
        }
        Ok(text)
    }

    fn check_present(&self, id: SchemaId, value: &Value) -> Result<()> {
        let node = self.schema.node(id);
        if node.required && value.is_null() {
            return Err(self.invalid(ValidationErrorKind::RequiredValueEmpty {
                property: node.name.clone(),
            }));
        }
        Ok(())
    }

    fn declared_type(&self, id: SchemaId) -> Result<SchemaType> {
        self.schema.effective_type(id).ok_or_else(|| {
            Error::structural(
                format!(
                    "Schema node '{}' has neither a type nor a reference",
                    self.schema.node(id).name
                ),
                Some(self.schema.node(id).source_info.clone()),
            )
        })
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::structural(
                format!("Nesting exceeds the maximum depth of {}", self.options.max_depth),
                None,
            ));
        }
        Ok(())
    }

    fn invalid(&self, kind: ValidationErrorKind) -> Error {
        ValidationError::new(kind, self.path.clone()).into()
    }

    fn check_error(&self, err: CheckError) -> Error {
        match err {
            CheckError::Violation(kind) => self.invalid(kind),
            misconfigured => Error::structural(misconfigured.message(), None),
        }
    }
}
