//! Schema compiler: parsed schema document to [`Schema`] arena.

use super::helpers;
use super::types::{Schema, SchemaId, SchemaNode, SchemaType};
use crate::error::{Error, Result};
use crate::restriction::Restriction;
use indexmap::IndexMap;
use std::collections::HashSet;
use yamlbind_tree::{CodecOptions, Node, SourceInfo};

/// Compile a schema document parsed in schema mode.
///
/// # Errors
///
/// Structural errors for shape rule violations (unknown keywords, `array`
/// without `items`, restrictions on the wrong type, ...) and reference
/// errors for `*name` values that are not in `definitions`.
pub fn compile(document: &Node, options: &CodecOptions) -> Result<Schema> {
    tracing::debug!(entries = document.children.len(), "compiling schema");
    if document.is_scalar() || document.is_sequence() {
        return Err(Error::structural(
            "Schema document must be a mapping",
            Some(document.source_info.clone()),
        ));
    }

    let mut compiler = SchemaCompiler {
        nodes: Vec::new(),
        definitions: IndexMap::new(),
        options,
    };
    let root = compiler.push(SchemaNode::new("", 0, document.source_info.clone()));
    compiler.nodes[root.0].schema_type = Some(SchemaType::Object);

    let mut definitions = None;
    let mut properties = None;
    let mut required = None;
    for entry in &document.children {
        match entry.name.as_str() {
            "definitions" => definitions = Some(entry),
            "properties" => properties = Some(entry),
            "required" => required = Some(entry),
            other => {
                return Err(Error::structural(
                    format!(
                        "Only `definitions`, `properties` and `required` are allowed at the top level, found '{}'",
                        other
                    ),
                    Some(entry.source_info.clone()),
                ));
            }
        }
    }

    if let Some(definitions) = definitions {
        compiler.definitions(definitions)?;
    }
    if let Some(properties) = properties {
        compiler.object_properties(root, properties, 1)?;
    }
    if let Some(required) = required {
        compiler.mark_required(root, required)?;
    }
    compiler.check_links()?;

    tracing::debug!(
        nodes = compiler.nodes.len(),
        definitions = compiler.definitions.len(),
        "schema compiled"
    );
    Ok(Schema {
        nodes: compiler.nodes,
        root,
        definitions: compiler.definitions,
    })
}

struct SchemaCompiler<'a> {
    nodes: Vec<SchemaNode>,
    definitions: IndexMap<String, SchemaId>,
    options: &'a CodecOptions,
}

/// Keyword entries of one schema node, gathered before the shape rules run.
#[derive(Default)]
struct Keywords<'n> {
    schema_type: Option<(SchemaType, bool)>,
    description: Option<String>,
    default: Option<String>,
    mapping: Option<(Option<String>, String)>,
    properties: Option<&'n Node>,
    items: Option<&'n Node>,
    required: Option<&'n Node>,
    restrictions: Vec<Restriction>,
}

impl SchemaCompiler<'_> {
    fn push(&mut self, node: SchemaNode) -> SchemaId {
        self.nodes.push(node);
        SchemaId(self.nodes.len() - 1)
    }

    fn node_mut(&mut self, id: SchemaId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    /// Reserve an id for every definition first so that definitions can
    /// refer to each other in any order, cycles included.
    fn definitions(&mut self, definitions: &Node) -> Result<()> {
        if definitions.is_scalar() || definitions.is_sequence() {
            return Err(Error::structural(
                "`definitions` must be a mapping of named schemas",
                Some(definitions.source_info.clone()),
            ));
        }
        let mut reserved = Vec::with_capacity(definitions.children.len());
        for entry in &definitions.children {
            let id = self.push(SchemaNode::new(&entry.name, 1, entry.source_info.clone()));
            self.definitions.insert(entry.name.clone(), id);
            reserved.push((id, entry));
        }
        for (id, entry) in reserved {
            tracing::trace!(definition = %entry.name, "compiling definition");
            self.schema_node(id, entry, 1, false)?;
        }
        Ok(())
    }

    /// Compile the children of a `properties` block into new nodes.
    fn properties(&mut self, properties: &Node, level: usize) -> Result<Vec<SchemaId>> {
        if properties.is_sequence() || properties.children.is_empty() {
            return Err(Error::structural(
                "`properties` must be a mapping of named schemas or a *reference",
                Some(properties.source_info.clone()),
            ));
        }
        let mut ids = Vec::with_capacity(properties.children.len());
        for entry in &properties.children {
            let id = self.push(SchemaNode::new(&entry.name, level, entry.source_info.clone()));
            self.schema_node(id, entry, level, false)?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Attach `properties` to an object node: inline children or a reference.
    fn object_properties(&mut self, id: SchemaId, properties: &Node, level: usize) -> Result<()> {
        if let Some(name) = helpers::reference_name(properties) {
            let target = self.resolve(name, &properties.source_info)?;
            self.node_mut(id).reference = Some(target);
            return Ok(());
        }
        let children = self.properties(properties, level)?;
        self.node_mut(id).children = children;
        Ok(())
    }

    fn resolve(&self, name: &str, location: &SourceInfo) -> Result<SchemaId> {
        self.definitions
            .get(name)
            .copied()
            .ok_or_else(|| Error::Reference {
                name: name.to_string(),
                location: Some(location.clone()),
            })
    }

    fn check_depth(&self, level: usize, location: &SourceInfo) -> Result<()> {
        if level > self.options.max_depth {
            return Err(Error::structural(
                format!("Nesting exceeds the maximum depth of {}", self.options.max_depth),
                Some(location.clone()),
            ));
        }
        Ok(())
    }

    /// Compile the schema written at `entry` into the node `id`.
    fn schema_node(&mut self, id: SchemaId, entry: &Node, level: usize, is_items: bool) -> Result<()> {
        self.check_depth(level, &entry.source_info)?;

        if let Some(name) = helpers::reference_name(entry) {
            let target = self.resolve(name, &entry.source_info)?;
            self.node_mut(id).reference = Some(target);
            return Ok(());
        }

        if entry.is_scalar() {
            // Shorthand: `name: string`
            let (schema_type, primitive) = helpers::type_name(entry)?;
            if !schema_type.is_scalar() {
                return Err(Error::structural(
                    format!(
                        "Schema '{}' of type {} needs a keyword block",
                        entry.name, schema_type
                    ),
                    Some(entry.source_info.clone()),
                ));
            }
            self.check_primitive_flag(primitive, is_items, entry)?;
            let node = self.node_mut(id);
            node.schema_type = Some(schema_type);
            node.primitive_array = primitive;
            return Ok(());
        }

        if entry.is_sequence() || entry.children.is_empty() {
            return Err(Error::structural(
                format!("Schema '{}' must be a mapping of keywords", entry.name),
                Some(entry.source_info.clone()),
            ));
        }

        let keywords = self.keywords(entry)?;
        self.apply(id, entry, level, is_items, keywords)
    }

    fn keywords<'n>(&self, entry: &'n Node) -> Result<Keywords<'n>> {
        let mut keywords = Keywords::default();
        for keyword in &entry.children {
            match keyword.name.as_str() {
                "type" => keywords.schema_type = Some(helpers::type_name(keyword)?),
                "description" => {
                    keywords.description = Some(helpers::scalar_text(keyword, "description")?.to_string())
                }
                "default" => {
                    keywords.default = Some(helpers::scalar_text(keyword, "default")?.to_string())
                }
                "mapping" => keywords.mapping = Some(helpers::mapping(keyword)?),
                "properties" => keywords.properties = Some(keyword),
                "items" => keywords.items = Some(keyword),
                "required" => keywords.required = Some(keyword),
                "minimum" => keywords
                    .restrictions
                    .push(Restriction::Minimum(helpers::number(keyword, "minimum")?)),
                "maximum" => keywords
                    .restrictions
                    .push(Restriction::Maximum(helpers::number(keyword, "maximum")?)),
                "exclusiveMinimum" => keywords.restrictions.push(Restriction::ExclusiveMinimum(
                    helpers::number(keyword, "exclusiveMinimum")?,
                )),
                "exclusiveMaximum" => keywords.restrictions.push(Restriction::ExclusiveMaximum(
                    helpers::number(keyword, "exclusiveMaximum")?,
                )),
                "minLength" => keywords
                    .restrictions
                    .push(Restriction::MinLength(helpers::count(keyword, "minLength")?)),
                "maxLength" => keywords
                    .restrictions
                    .push(Restriction::MaxLength(helpers::count(keyword, "maxLength")?)),
                "minItems" => keywords
                    .restrictions
                    .push(Restriction::MinItems(helpers::count(keyword, "minItems")?)),
                "maxItems" => keywords
                    .restrictions
                    .push(Restriction::MaxItems(helpers::count(keyword, "maxItems")?)),
                "pattern" => keywords
                    .restrictions
                    .push(Restriction::Pattern(helpers::pattern(keyword)?)),
                other => {
                    return Err(Error::structural(
                        format!("Unknown schema keyword '{}'", other),
                        Some(keyword.source_info.clone()),
                    ));
                }
            }
        }
        Ok(keywords)
    }

    /// Enforce the shape rules and fill the node.
    fn apply(
        &mut self,
        id: SchemaId,
        entry: &Node,
        level: usize,
        is_items: bool,
        keywords: Keywords<'_>,
    ) -> Result<()> {
        let location = Some(entry.source_info.clone());
        let (declared, primitive) = match keywords.schema_type {
            Some((schema_type, primitive)) => (Some(schema_type), primitive),
            None => (None, false),
        };
        let schema_type = declared
            .or_else(|| {
                (keywords.properties.is_some() || keywords.mapping.is_some())
                    .then_some(SchemaType::Object)
            })
            .or_else(|| keywords.items.map(|_| SchemaType::Array))
            .ok_or_else(|| {
                Error::structural(
                    format!("Schema '{}' needs a type, a mapping or a *reference", entry.name),
                    location.clone(),
                )
            })?;
        self.check_primitive_flag(primitive, is_items, entry)?;

        match schema_type {
            SchemaType::Array => {
                if keywords.properties.is_some() {
                    return Err(Error::structural(
                        format!("Array schema '{}' cannot have `properties`", entry.name),
                        location,
                    ));
                }
                let items = keywords.items.ok_or_else(|| {
                    Error::structural(
                        format!("Array schema '{}' requires `items`", entry.name),
                        location.clone(),
                    )
                })?;
                let items_id = self.push(SchemaNode::new("items", level + 1, items.source_info.clone()));
                self.schema_node(items_id, items, level + 1, true)?;
                self.node_mut(id).children = vec![items_id];
            }
            SchemaType::Object => {
                if keywords.items.is_some() {
                    return Err(Error::structural(
                        format!("Object schema '{}' cannot have `items`", entry.name),
                        location,
                    ));
                }
                let properties = keywords.properties.ok_or_else(|| {
                    Error::structural(
                        format!("Object schema '{}' requires `properties`", entry.name),
                        location.clone(),
                    )
                })?;
                self.object_properties(id, properties, level + 1)?;
            }
            scalar => {
                if keywords.properties.is_some() || keywords.items.is_some() {
                    return Err(Error::structural(
                        format!(
                            "Schema '{}' of type {} cannot have `properties` or `items`",
                            entry.name, scalar
                        ),
                        location,
                    ));
                }
            }
        }

        if let Some(restriction) = keywords
            .restrictions
            .iter()
            .find(|r| !r.applies_to(schema_type))
        {
            return Err(Error::structural(
                format!(
                    "Restriction '{}' cannot apply to type {}",
                    restriction.keyword(),
                    schema_type
                ),
                location,
            ));
        }

        let (member, container) = match keywords.mapping {
            Some((member, container)) => (member, Some(container)),
            None => (None, None),
        };
        let node = self.node_mut(id);
        node.schema_type = Some(schema_type);
        node.primitive_array = primitive;
        node.description = keywords.description;
        node.default = keywords.default;
        node.member = member;
        node.container = container;
        node.restrictions = keywords.restrictions;

        if let Some(required) = keywords.required {
            if schema_type != SchemaType::Object {
                return Err(Error::structural(
                    format!("`required` is only allowed on object schemas, '{}' is {}", entry.name, schema_type),
                    Some(required.source_info.clone()),
                ));
            }
            self.mark_required(id, required)?;
        }
        Ok(())
    }

    fn check_primitive_flag(&self, primitive: bool, is_items: bool, entry: &Node) -> Result<()> {
        if primitive && !is_items {
            return Err(Error::structural(
                format!(
                    "The `[]` suffix is only allowed on array items, found on '{}'",
                    entry.name
                ),
                Some(entry.source_info.clone()),
            ));
        }
        Ok(())
    }

    /// Mark the named children of an object node as required.
    fn mark_required(&mut self, id: SchemaId, required: &Node) -> Result<()> {
        if self.nodes[id.0].children.is_empty() && self.nodes[id.0].reference.is_some() {
            return Err(Error::structural(
                "`required` cannot be combined with a referenced `properties` block",
                Some(required.source_info.clone()),
            ));
        }
        for (name, location) in helpers::name_list(required, "required", self.options.quote)? {
            let child = self.nodes[id.0]
                .children
                .iter()
                .copied()
                .find(|child| self.nodes[child.0].name == name)
                .ok_or_else(|| {
                    Error::structural(
                        format!("Required property '{}' is not declared in `properties`", name),
                        Some(location),
                    )
                })?;
            self.node_mut(child).required = true;
        }
        Ok(())
    }

    /// Checks that need every definition compiled: reference chains must
    /// end in a typed node, `properties` references must point at objects
    /// and array items may not themselves be arrays.
    fn check_links(&self) -> Result<()> {
        for (index, node) in self.nodes.iter().enumerate() {
            let mut seen = HashSet::from([index]);
            let mut current = node;
            while let Some(next) = current.reference {
                if !seen.insert(next.0) {
                    return Err(Error::structural(
                        format!("Reference cycle through '{}'", self.nodes[next.0].name),
                        Some(node.source_info.clone()),
                    ));
                }
                current = &self.nodes[next.0];
                // A typed node only borrows its target's properties.
                if current.schema_type.is_some() && current.reference.is_none() {
                    break;
                }
            }

            if node.schema_type == Some(SchemaType::Object)
                && let Some(target) = node.reference
                && self.effective_type(target) != Some(SchemaType::Object)
            {
                return Err(Error::structural(
                    format!(
                        "`properties` of '{}' must reference an object definition",
                        node.name
                    ),
                    Some(node.source_info.clone()),
                ));
            }

            if node.schema_type == Some(SchemaType::Array)
                && let Some(items) = node.children.first()
                && self.effective_type(*items) == Some(SchemaType::Array)
            {
                return Err(Error::structural(
                    format!("Nested arrays are not supported ('{}')", node.name),
                    Some(node.source_info.clone()),
                ));
            }
        }
        Ok(())
    }

    fn effective_type(&self, id: SchemaId) -> Option<SchemaType> {
        let mut current = &self.nodes[id.0];
        for _ in 0..self.nodes.len() {
            match (current.schema_type, current.reference) {
                (None, Some(next)) => current = &self.nodes[next.0],
                (schema_type, _) => return schema_type,
            }
        }
        None
    }
}
