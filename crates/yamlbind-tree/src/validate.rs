//! Structural sanity pass over raw document lines.
//!
//! The validator walks the same block structure the tree parser does but
//! materializes nothing. It runs before every parse so that the parser can
//! rely on well-formed indentation, brackets and value starts.

use crate::lexer::{self, Line, Token};
use crate::{CodecOptions, Error, Result};
use std::collections::HashSet;

/// Validate the lines of a document without building a tree.
///
/// # Errors
///
/// Returns the first structural violation found: tabs, a missing `---`
/// header, bad indentation, more than one top-level `: `, unbalanced
/// brackets, reserved value starts, unclosed flow values, or markers not
/// followed by a deeper block.
pub fn validate_lines(lines: &[&str], options: &CodecOptions) -> Result<()> {
    validate_lines_in(lines, options, None)
}

/// Validate a whole document text.
pub fn validate_text(content: &str, options: &CodecOptions) -> Result<()> {
    let lines: Vec<&str> = content.lines().collect();
    validate_lines(&lines, options)
}

pub(crate) fn validate_lines_in(
    lines: &[&str],
    options: &CodecOptions,
    file: Option<&str>,
) -> Result<()> {
    options.validate()?;
    let prepared = lexer::prepare_lines(lines, options.quote, file)?;
    let body = lexer::document_body(prepared, file)?;
    let validator = LineValidator {
        quote: options.quote,
        max_depth: options.max_depth,
    };
    validator.block(&body, 1)
}

struct LineValidator {
    quote: char,
    max_depth: usize,
}

impl LineValidator {
    /// Validate a block: every line at the block's column starts a
    /// sibling, deeper lines belong to the sibling above them.
    fn block(&self, lines: &[Line], depth: usize) -> Result<()> {
        let Some(first) = lines.first() else {
            return Ok(());
        };
        if depth > self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
                location: Some(first.location()),
            });
        }

        let column = first.indent;
        let sequence = first.is_item();
        let mut keys = HashSet::new();
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];
            if line.indent < column {
                return Err(Error::structural(
                    format!(
                        "Content starts before the expected indentation column {}",
                        column + 1
                    ),
                    line.location(),
                ));
            }
            if line.is_item() != sequence {
                return Err(Error::structural(
                    "Sequence items and mapping entries cannot be mixed at the same indentation",
                    line.location(),
                ));
            }

            lexer::check_brackets(line.content, self.quote, &line.location())?;
            let end = sub_block_end(lines, i, column, self.quote);
            let sub = &lines[i + 1..end];

            if sequence {
                self.item(line, sub, depth)?;
            } else {
                let key = self.entry(line, sub, depth)?;
                if !keys.insert(key.clone()) {
                    return Err(Error::structural(
                        format!("Duplicate key '{}'", key),
                        line.location(),
                    ));
                }
            }
            i = end;
        }
        Ok(())
    }

    fn entry(&self, line: &Line, sub: &[Line], depth: usize) -> Result<String> {
        let location = line.location();
        let Some(sep) = lexer::find_separator(line.content, self.quote, &location)? else {
            return Err(Error::structural(
                "Expected `key: value` or a `- ` sequence item",
                location,
            ));
        };
        let key = line.content[..sep].trim();
        if key.is_empty() {
            return Err(Error::structural("Empty mapping key", location));
        }
        let value = line.content[sep + 1..].trim();
        self.value(line, value, sub, depth)?;
        Ok(lexer::unquote_key(key, self.quote))
    }

    fn item(&self, line: &Line, sub: &[Line], depth: usize) -> Result<()> {
        let rest = line.content[1..].trim_start();
        if rest.is_empty() {
            return self.block(sub, depth + 1);
        }

        let shifted = line.shifted(line.content.len() - rest.len());
        if opens_nested_block(rest, self.quote, &shifted.location())? {
            let mut nested = Vec::with_capacity(sub.len() + 1);
            nested.push(shifted);
            nested.extend_from_slice(sub);
            return self.block(&nested, depth + 1);
        }
        self.value(&shifted, rest, sub, depth)
    }

    fn value(&self, line: &Line, text: &str, sub: &[Line], depth: usize) -> Result<()> {
        let location = line.location();
        match lexer::value_token(text, self.quote, &location)? {
            Token::Empty => self.block(sub, depth + 1),
            Token::Anchor { rest, .. } if !rest.is_empty() => {
                if matches!(
                    lexer::value_token(rest, self.quote, &location)?,
                    Token::Block { .. }
                ) {
                    return self.marker_block(line, sub, "|");
                }
                self.scalar_only(sub)?;
                self.value(line, rest, sub, depth)
            }
            Token::Anchor { .. } => {
                expect_deeper(line, sub, "an anchor")?;
                self.block(sub, depth + 1)
            }
            Token::Block { folded, .. } => {
                self.marker_block(line, sub, if folded { ">" } else { "|" })
            }
            Token::FlowMap(text) => {
                self.scalar_only(sub)?;
                self.flow_map(text, &location)
            }
            Token::Plain(_) | Token::Quoted(_) | Token::FlowSeq(_) | Token::Alias(_) => {
                self.scalar_only(sub)
            }
        }
    }

    /// A text block: lines must be deeper than the marker and may not start
    /// before the block's own column. Their content is not analyzed.
    fn marker_block(&self, line: &Line, sub: &[Line], marker: &str) -> Result<()> {
        expect_deeper(line, sub, &format!("a `{}` marker", marker))?;
        let column = sub[0].indent;
        if let Some(early) = sub.iter().find(|l| l.indent < column) {
            return Err(Error::structural(
                "Text block line starts before the block's indentation",
                early.location(),
            ));
        }
        Ok(())
    }

    fn scalar_only(&self, sub: &[Line]) -> Result<()> {
        match sub.first() {
            Some(extra) => Err(Error::structural(
                "A scalar value cannot be followed by a nested block",
                extra.location(),
            )),
            None => Ok(()),
        }
    }

    fn flow_map(&self, text: &str, location: &crate::SourceInfo) -> Result<()> {
        let inner = &text[1..text.len() - 1];
        for part in lexer::split_flow_items(inner, self.quote) {
            let Some(sep) = lexer::find_separator(part, self.quote, location)? else {
                return Err(Error::structural(
                    "Flow mapping entries must be `key: value`",
                    location.clone(),
                ));
            };
            let value = part[sep + 1..].trim();
            match lexer::value_token(value, self.quote, location)? {
                Token::FlowMap(nested) => self.flow_map(nested, location)?,
                Token::Empty | Token::Plain(_) | Token::Quoted(_) | Token::FlowSeq(_) => {}
                _ => {
                    return Err(Error::structural(
                        "Anchors, aliases and text blocks are not allowed inside flow mappings",
                        location.clone(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Text after a `- ` that opens a block of its own: a nested sequence item
/// or an inline `key: value`.
pub(crate) fn opens_nested_block(
    rest: &str,
    quote: char,
    location: &crate::SourceInfo,
) -> Result<bool> {
    if lexer::is_item(rest) {
        return Ok(true);
    }
    Ok(lexer::find_separator(rest, quote, location)?.is_some())
}

/// End (exclusive) of the block owned by `lines[start]`: every following
/// line indented deeper than `column`. An entry with no value also owns
/// `- ` items at its own column.
pub(crate) fn sub_block_end(lines: &[Line], start: usize, column: usize, quote: char) -> usize {
    let owns_dash_siblings =
        !lines[start].is_item() && entry_value_is_empty(lines[start].content, quote);
    let mut end = start + 1;
    while end < lines.len() {
        let next = &lines[end];
        let deeper = next.indent > column;
        let dash_sibling = owns_dash_siblings && next.indent == column && next.is_item();
        if !(deeper || dash_sibling) {
            break;
        }
        end += 1;
    }
    end
}

fn entry_value_is_empty(content: &str, quote: char) -> bool {
    match lexer::separators(content, quote).first() {
        Some(&sep) => content[sep + 1..].trim().is_empty(),
        None => false,
    }
}

fn expect_deeper(line: &Line, sub: &[Line], what: &str) -> Result<()> {
    match sub.first() {
        Some(next) if next.indent > line.indent => Ok(()),
        Some(next) => Err(Error::structural(
            format!("Lines following {} must be indented deeper than it", what),
            next.location(),
        )),
        None => Err(Error::structural(
            format!("Lines following {} must be indented deeper than it", what),
            line.location(),
        )),
    }
}
