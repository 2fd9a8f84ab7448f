//! Line parser that builds [`Node`] trees.

use crate::lexer::{self, Chomp, Line, Token};
use crate::node::{Node, NodeKind, Scalar};
use crate::validate::{opens_nested_block, sub_block_end, validate_lines_in};
use crate::{CodecOptions, Error, Result, SourceInfo};
use std::collections::HashMap;

/// How aliases without a matching anchor are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Data documents: every `*name` must refer to an earlier `&name`.
    #[default]
    Data,
    /// Schema documents: an unresolved `*name` is kept as plain text so the
    /// schema compiler can resolve it against `definitions`.
    Schema,
}

/// Parse a data document with default options.
///
/// # Example
///
/// ```rust
/// use yamlbind_tree::parse;
///
/// let doc = parse("---\ntitle: My Document\n").unwrap();
/// assert_eq!(doc.get("title").and_then(|n| n.text()), Some("My Document"));
/// ```
///
/// # Errors
///
/// Returns an error if the document is structurally invalid or an alias
/// cannot be resolved.
pub fn parse(content: &str) -> Result<Node> {
    parse_with(content, &CodecOptions::default(), ParseMode::Data)
}

/// Parse a data document with an associated filename.
///
/// The filename is included in every node's source location.
///
/// # Example
///
/// ```rust
/// use yamlbind_tree::parse_file;
///
/// let doc = parse_file("---\ntitle: x\n", "config.yaml").unwrap();
/// assert_eq!(doc.source_info.file, Some("config.yaml".into()));
/// ```
pub fn parse_file(content: &str, filename: &str) -> Result<Node> {
    let lines: Vec<&str> = content.lines().collect();
    parse_lines_in(
        &lines,
        &CodecOptions::default(),
        ParseMode::Data,
        Some(filename),
    )
}

/// Parse a document with explicit options and mode.
pub fn parse_with(content: &str, options: &CodecOptions, mode: ParseMode) -> Result<Node> {
    let lines: Vec<&str> = content.lines().collect();
    parse_lines(&lines, options, mode)
}

/// Parse a document with an associated filename, explicit options and mode.
pub fn parse_named(
    content: &str,
    filename: &str,
    options: &CodecOptions,
    mode: ParseMode,
) -> Result<Node> {
    let lines: Vec<&str> = content.lines().collect();
    parse_lines_in(&lines, options, mode, Some(filename))
}

/// Parse pre-split raw lines.
pub fn parse_lines(lines: &[&str], options: &CodecOptions, mode: ParseMode) -> Result<Node> {
    parse_lines_in(lines, options, mode, None)
}

pub(crate) fn parse_lines_in(
    lines: &[&str],
    options: &CodecOptions,
    mode: ParseMode,
    file: Option<&str>,
) -> Result<Node> {
    tracing::debug!(lines = lines.len(), ?mode, "parsing document");
    validate_lines_in(lines, options, file)?;

    let prepared = lexer::prepare_lines(lines, options.quote, file)?;
    let body = lexer::document_body(prepared, file)?;

    let mut parser = TreeBuilder {
        raw: lines,
        quote: options.quote,
        max_depth: options.max_depth,
        mode,
        anchors: HashMap::new(),
    };
    let mut document = Node::new(
        "",
        0,
        NodeKind::Document,
        SourceInfo::new(file.map(str::to_string), 0, 1, 1, 0),
    );
    document.children = parser.block(&body, 1)?;
    Ok(document)
}

/// Builds nodes from validated lines. The anchor table lives for one call.
struct TreeBuilder<'r> {
    /// Unprepared source lines; text blocks are sliced from these.
    raw: &'r [&'r str],
    quote: char,
    max_depth: usize,
    mode: ParseMode,
    anchors: HashMap<String, Node>,
}

impl TreeBuilder<'_> {
    fn block(&mut self, lines: &[Line], level: usize) -> Result<Vec<Node>> {
        let Some(first) = lines.first() else {
            return Ok(Vec::new());
        };
        self.check_depth(level, || first.location())?;

        let column = first.indent;
        let mut nodes = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let line = &lines[i];
            let end = sub_block_end(lines, i, column, self.quote);
            let sub = &lines[i + 1..end];
            let node = if line.is_item() {
                self.item(line, sub, level)?
            } else {
                self.entry(line, sub, level)?
            };
            nodes.push(node);
            i = end;
        }
        Ok(nodes)
    }

    fn entry(&mut self, line: &Line, sub: &[Line], level: usize) -> Result<Node> {
        let location = line.location();
        let sep = lexer::find_separator(line.content, self.quote, &location)?
            .ok_or_else(|| Error::structural("Expected `key: value`", location.clone()))?;
        let key = lexer::unquote_key(line.content[..sep].trim(), self.quote);
        let value = line.content[sep + 1..].trim();

        let mut node = Node::new(key, level, NodeKind::Entry, location);
        self.fill(&mut node, line, value, sub)?;
        Ok(node)
    }

    fn item(&mut self, line: &Line, sub: &[Line], level: usize) -> Result<Node> {
        let mut node = Node::new("", level, NodeKind::SequenceItem, line.location());
        let rest = line.content[1..].trim_start();
        if rest.is_empty() {
            node.children = self.block(sub, level + 1)?;
            return Ok(node);
        }

        let shifted = line.shifted(line.content.len() - rest.len());
        if opens_nested_block(rest, self.quote, &shifted.location())? {
            let mut nested = Vec::with_capacity(sub.len() + 1);
            nested.push(shifted);
            nested.extend_from_slice(sub);
            node.children = self.block(&nested, level + 1)?;
        } else {
            self.fill(&mut node, &shifted, rest, sub)?;
        }
        Ok(node)
    }

    /// Fill `node` from the value text on its own line plus the nested lines.
    fn fill(&mut self, node: &mut Node, line: &Line, text: &str, sub: &[Line]) -> Result<()> {
        let location = line.location();
        match lexer::value_token(text, self.quote, &location)? {
            Token::Empty => {
                node.children = self.block(sub, node.level + 1)?;
            }
            Token::Plain(text) | Token::FlowSeq(text) => {
                node.scalar = Some(Scalar::plain(text));
            }
            Token::Quoted(text) => {
                node.scalar = Some(Scalar::quoted(text));
            }
            Token::FlowMap(text) => {
                node.children = self.flow_map(text, node.level + 1, &location)?;
            }
            Token::Block { folded, chomp } => {
                node.scalar = Some(Scalar::quoted(block_text(self.raw, sub, folded, chomp)));
            }
            Token::Anchor { name, rest } => {
                if rest.is_empty() {
                    node.children = self.block(sub, node.level + 1)?;
                } else {
                    self.fill(node, line, rest, sub)?;
                }
                tracing::trace!(anchor = name, "registered anchor");
                self.anchors.insert(name.to_string(), node.clone());
            }
            Token::Alias(name) => match self.anchors.get(name) {
                Some(target) => {
                    *node = target.rebased(&node.name, node.level, node.kind, node.source_info.clone());
                }
                None if self.mode == ParseMode::Schema => {
                    node.scalar = Some(Scalar::plain(text));
                }
                None => {
                    return Err(Error::Reference {
                        name: name.to_string(),
                        location: Some(location),
                    });
                }
            },
        }
        Ok(())
    }

    /// Materialize `{k: v, ...}` as entry children.
    fn flow_map(&mut self, text: &str, level: usize, location: &SourceInfo) -> Result<Vec<Node>> {
        self.check_depth(level, || location.clone())?;
        let inner = &text[1..text.len() - 1];
        let mut children = Vec::new();
        for part in lexer::split_flow_items(inner, self.quote) {
            let sep = lexer::find_separator(part, self.quote, location)?.ok_or_else(|| {
                Error::structural("Flow mapping entries must be `key: value`", location.clone())
            })?;
            let key = lexer::unquote_key(part[..sep].trim(), self.quote);
            let mut child = Node::new(key, level, NodeKind::Entry, location.clone());
            match lexer::value_token(part[sep + 1..].trim(), self.quote, location)? {
                Token::Empty => {}
                Token::Plain(value) | Token::FlowSeq(value) => {
                    child.scalar = Some(Scalar::plain(value));
                }
                Token::Quoted(value) => child.scalar = Some(Scalar::quoted(value)),
                Token::FlowMap(value) => {
                    child.children = self.flow_map(value, level + 1, location)?;
                }
                _ => {
                    return Err(Error::structural(
                        "Anchors, aliases and text blocks are not allowed inside flow mappings",
                        location.clone(),
                    ));
                }
            }
            children.push(child);
        }
        Ok(children)
    }

    fn check_depth(&self, level: usize, location: impl FnOnce() -> SourceInfo) -> Result<()> {
        if level > self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
                location: Some(location()),
            });
        }
        Ok(())
    }
}

/// Text of a `|`/`>` block with the block's indentation removed.
///
/// The block spans the source lines from its first to its last content
/// line, so blank lines and lines starting with `#` are kept. Comment lines
/// indented less than the block are not part of it.
fn block_text(raw: &[&str], lines: &[Line], folded: bool, chomp: Chomp) -> String {
    let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
        return String::new();
    };
    let base = lines.iter().map(|l| l.indent).min().unwrap_or(0);

    let mut rows = Vec::with_capacity(last.number + 1 - first.number);
    for source in &raw[first.number - 1..last.number] {
        let source = source.trim_end();
        let indent = source.len() - source.trim_start_matches(' ').len();
        if source.is_empty() {
            rows.push("");
        } else if indent >= base {
            rows.push(&source[base..]);
        }
    }

    let mut text = if folded {
        fold(&rows)
    } else {
        rows.join("\n")
    };
    if chomp == Chomp::Clip && !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Join consecutive rows with a space; each empty row becomes a line break.
fn fold(rows: &[&str]) -> String {
    let mut text = String::new();
    let mut after_break = true;
    for row in rows {
        if row.is_empty() {
            text.push('\n');
            after_break = true;
        } else {
            if !after_break {
                text.push(' ');
            }
            text.push_str(row);
            after_break = false;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ValueType;

    fn schema(text: &str) -> Result<Node> {
        parse_with(text, &CodecOptions::default(), ParseMode::Schema)
    }

    #[test]
    fn test_parse_simple_mapping() {
        let doc = parse("---\nname: \"Alice\"\nage: 30\n...").unwrap();
        assert_eq!(doc.kind, NodeKind::Document);
        assert_eq!(doc.children.len(), 2);

        let name = doc.get("name").unwrap();
        assert_eq!(name.level, 1);
        assert_eq!(name.text(), Some("Alice"));
        assert_eq!(name.value_type(), ValueType::String);

        let age = doc.get("age").unwrap();
        assert_eq!(age.value_type(), ValueType::Integer);
        assert_eq!(age.source_info.line, 3);
    }

    #[test]
    fn test_parse_sequence() {
        let doc = parse("---\ntags:\n  - a\n  - \"b\"\n  -\n").unwrap();
        let tags = doc.get("tags").unwrap();
        assert!(tags.is_sequence());
        let items: Vec<_> = tags.items().collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].text(), Some("a"));
        assert_eq!(items[0].level, 2);
        assert!(items[1].scalar.as_ref().unwrap().quoted);
        assert!(items[2].is_empty());
    }

    #[test]
    fn test_parse_sequence_of_mappings() {
        let text = "---\npeople:\n    - name: a\n      age: 3\n    - name: b\n";
        let doc = parse(text).unwrap();
        let people: Vec<_> = doc.get("people").unwrap().items().collect();
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].children.len(), 2);
        assert_eq!(people[0].get("age").unwrap().level, 3);
        assert_eq!(people[1].get("name").and_then(|n| n.text()), Some("b"));
    }

    #[test]
    fn test_dash_items_at_key_column() {
        let doc = parse("---\ntags:\n- a\n- b\nname: x\n").unwrap();
        assert_eq!(doc.get("tags").unwrap().items().count(), 2);
        assert_eq!(doc.get("name").and_then(|n| n.text()), Some("x"));
    }

    #[test]
    fn test_nested_sequences() {
        let doc = parse("---\nm:\n  - - 1\n    - 2\n  - - 3\n").unwrap();
        let outer: Vec<_> = doc.get("m").unwrap().items().collect();
        assert_eq!(outer.len(), 2);
        assert_eq!(outer[0].items().count(), 2);
        assert_eq!(outer[1].items().next().and_then(|n| n.text()), Some("3"));
    }

    #[test]
    fn test_anchor_and_alias() {
        let text = "---\nbase: &b\n  x: 1\n  y: 2\ncopy: *b\nport: &p 80\nother: *p\n";
        let doc = parse(text).unwrap();
        let copy = doc.get("copy").unwrap();
        assert_eq!(copy.name, "copy");
        assert_eq!(copy.children.len(), 2);
        assert_eq!(copy.get("y").unwrap().level, 2);
        assert_eq!(doc.get("other").and_then(|n| n.text()), Some("80"));
    }

    #[test]
    fn test_unresolved_alias_is_reference_error() {
        let err = parse("---\na: *missing\n").unwrap_err();
        assert!(matches!(err, Error::Reference { ref name, .. } if name == "missing"));
    }

    #[test]
    fn test_schema_mode_keeps_unresolved_alias() {
        let doc = schema("---\nproperties:\n  home: *address\n").unwrap();
        let home = doc.get("properties").unwrap().get("home").unwrap();
        assert_eq!(home.text(), Some("*address"));
        assert!(!home.scalar.as_ref().unwrap().quoted);
    }

    #[test]
    fn test_block_scalars() {
        let text = "---\nlit: |\n  one\n    two\nfold: >-\n  a\n  b\nafter: x\n";
        let doc = parse(text).unwrap();
        assert_eq!(doc.get("lit").and_then(|n| n.text()), Some("one\n  two\n"));
        assert_eq!(doc.get("fold").and_then(|n| n.text()), Some("a b"));
        assert_eq!(doc.get("fold").unwrap().value_type(), ValueType::String);
        assert_eq!(doc.get("after").and_then(|n| n.text()), Some("x"));
    }

    #[test]
    fn test_block_keeps_blank_and_hash_lines() {
        let doc = parse("---\na: |\n  one\n\n  #two\n  three\n").unwrap();
        assert_eq!(doc.get("a").and_then(|n| n.text()), Some("one\n\n#two\nthree\n"));

        let doc = parse("---\na: >-\n  one\n  two\n\n  three\n# note\nb: 1\n").unwrap();
        assert_eq!(doc.get("a").and_then(|n| n.text()), Some("one two\nthree"));
        assert_eq!(doc.get("b").and_then(|n| n.text()), Some("1"));
    }

    #[test]
    fn test_flow_forms() {
        let doc = parse("---\npoint: {x: 1, y: \"2\"}\nlist: [1, 2]\n").unwrap();
        let point = doc.get("point").unwrap();
        assert_eq!(point.children.len(), 2);
        assert_eq!(point.get("x").unwrap().value_type(), ValueType::Integer);
        assert_eq!(point.get("y").unwrap().value_type(), ValueType::String);

        let list = doc.get("list").unwrap();
        assert_eq!(list.text(), Some("[1, 2]"));
        assert_eq!(list.value_type(), ValueType::Array);
    }

    #[test]
    fn test_quoted_null_stays_string() {
        let doc = schema("---\ndefault: \"null\"\nother: null\n").unwrap();
        assert_eq!(doc.get("default").unwrap().value_type(), ValueType::String);
        assert!(doc.get("other").unwrap().scalar.as_ref().unwrap().is_null_literal());
    }

    #[test]
    fn test_single_quote_dialect() {
        let options = CodecOptions::default().with_quote('\'');
        let doc = parse_with("---\nname: 'it\\'s: ok'\n", &options, ParseMode::Data).unwrap();
        assert_eq!(doc.get("name").and_then(|n| n.text()), Some("it's: ok"));
    }

    #[test]
    fn test_parse_file_sets_filename() {
        let err = parse_file("---\na: [\n", "bad.yaml").unwrap_err();
        assert_eq!(err.location().unwrap().file.as_deref(), Some("bad.yaml"));
    }

    #[test]
    fn test_parse_lines() {
        let doc = parse_lines(&["---", "a: 1"], &CodecOptions::default(), ParseMode::Data).unwrap();
        assert_eq!(doc.children.len(), 1);
    }
}
