//! Line-level lexical helpers shared by the line validator and the tree parser.
//!
//! Everything here works on a single line of content. Block structure is
//! handled by the callers.

use crate::classify::is_signed_number;
use crate::{Error, Result, SourceInfo};

/// Characters that force quoting when they appear in emitted text and that
/// may not start a plain value.
pub const RESERVED_CHARS: &[char] = &[
    ':', '{', '}', '[', ']', ',', '&', '*', '#', '?', '|', '-', '<', '>', '=', '!', '%', '@', '\\',
];

/// Reserved characters that have no structural meaning at the start of a value.
const RESERVED_VALUE_STARTS: &[char] = &[
    ':', '}', ']', ',', '#', '?', '-', '<', '=', '!', '%', '@', '\\',
];

/// A non-blank, comment-stripped source line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    /// 1-based line number
    pub number: usize,
    /// 0-based column of the first content character
    pub indent: usize,
    /// Character offset of the start of the line in the document
    pub offset: usize,
    /// Content with comments and trailing whitespace removed
    pub content: &'a str,
    /// Original text from `indent` on, trailing whitespace removed
    pub raw: &'a str,
    pub file: Option<&'a str>,
}

impl<'a> Line<'a> {
    /// Location of the content, shifted `shift` characters to the right.
    pub fn location_at(&self, shift: usize, len: usize) -> SourceInfo {
        let col = self.indent + shift;
        SourceInfo::new(
            self.file.map(str::to_string),
            self.offset + col,
            self.number,
            col + 1,
            len,
        )
    }

    pub fn location(&self) -> SourceInfo {
        self.location_at(0, self.content.chars().count())
    }

    /// The same line seen from `shift` bytes into its content. Used for the
    /// text following a `- ` sequence marker.
    pub fn shifted(&self, shift: usize) -> Line<'a> {
        Line {
            indent: self.indent + shift,
            content: &self.content[shift..],
            raw: &self.raw[shift.min(self.raw.len())..],
            ..*self
        }
    }

    pub fn is_item(&self) -> bool {
        is_item(self.content)
    }
}

/// A `- ` sequence marker (or a lone `-`).
pub(crate) fn is_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Split raw text into prepared lines: reject tabs, strip comments, drop
/// blank lines.
pub(crate) fn prepare_lines<'a>(
    lines: &[&'a str],
    quote: char,
    file: Option<&'a str>,
) -> Result<Vec<Line<'a>>> {
    let mut prepared = Vec::with_capacity(lines.len());
    let mut offset = 0;

    for (i, raw_line) in lines.iter().enumerate() {
        let number = i + 1;
        if let Some(pos) = raw_line.find('\t') {
            let col = raw_line[..pos].chars().count();
            return Err(Error::structural(
                "Tab characters are not allowed; indent with spaces",
                SourceInfo::new(file.map(str::to_string), offset + col, number, col + 1, 1),
            ));
        }

        let trimmed = raw_line.trim_end();
        let body = trimmed.trim_start_matches(' ');
        let indent = trimmed.len() - body.len();
        let content = strip_comment(body, quote).trim_end();

        if !content.is_empty() {
            prepared.push(Line {
                number,
                indent,
                offset,
                content,
                raw: body,
                file,
            });
        }
        offset += raw_line.chars().count() + 1;
    }

    Ok(prepared)
}

/// Check the `---` header, drop the optional `...` trailer and return the
/// body lines.
pub(crate) fn document_body<'a>(lines: Vec<Line<'a>>, file: Option<&str>) -> Result<Vec<Line<'a>>> {
    let Some(first) = lines.first() else {
        return Err(Error::Structural {
            message: "Document must start with a line containing exactly `---`".to_string(),
            location: Some(SourceInfo::new(file.map(str::to_string), 0, 1, 1, 0)),
        });
    };
    if first.number != 1 {
        return Err(Error::Structural {
            message: "Document must start with a line containing exactly `---`".to_string(),
            location: Some(SourceInfo::new(file.map(str::to_string), 0, 1, 1, 0)),
        });
    }
    if first.indent != 0 || first.raw != "---" {
        return Err(Error::structural(
            "Document must start with a line containing exactly `---`",
            first.location(),
        ));
    }

    let mut body: Vec<Line<'a>> = lines.into_iter().skip(1).collect();
    if body
        .last()
        .is_some_and(|l| l.indent == 0 && l.content == "...")
    {
        body.pop();
    }
    if let Some(marker) = body
        .iter()
        .find(|l| l.indent == 0 && (l.content == "---" || l.content == "..."))
    {
        return Err(Error::structural(
            "Multiple documents in one stream are not supported",
            marker.location(),
        ));
    }
    Ok(body)
}

/// Iterator over the characters of `text` that lie outside quoted regions.
///
/// A quote opens a quoted region only at the start of a token (start of
/// text, or after whitespace, `[`, `{`, `,`). Inside quotes a backslash
/// escapes the following character.
struct Unquoted<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    quote: char,
    prev: Option<char>,
    in_quote: bool,
    unterminated: bool,
}

impl<'a> Unquoted<'a> {
    fn new(text: &'a str, quote: char) -> Self {
        Self {
            chars: text.char_indices().peekable(),
            quote,
            prev: None,
            in_quote: false,
            unterminated: false,
        }
    }
}

impl Iterator for Unquoted<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<(usize, char)> {
        loop {
            let (i, c) = match self.chars.next() {
                Some(next) => next,
                None => {
                    self.unterminated = self.in_quote;
                    return None;
                }
            };
            let prev = self.prev.replace(c);

            if self.in_quote {
                if c == '\\' {
                    self.chars.next();
                    self.prev = Some(' ');
                } else if c == self.quote {
                    self.in_quote = false;
                }
                continue;
            }

            if c == self.quote && prev.is_none_or(|p| p.is_whitespace() || matches!(p, '[' | '{' | ',')) {
                self.in_quote = true;
                continue;
            }
            return Some((i, c));
        }
    }
}

/// Remove an unquoted `#` comment. A `#` only starts a comment at the start
/// of the content or after whitespace.
pub(crate) fn strip_comment(body: &str, quote: char) -> &str {
    for (i, c) in Unquoted::new(body, quote) {
        if c == '#' && (i == 0 || body[..i].ends_with(char::is_whitespace)) {
            return &body[..i];
        }
    }
    body
}

/// Byte indices of every `:` outside quotes and brackets that is not
/// escaped with a backslash.
fn top_level_colons(text: &str, quote: char) -> Vec<usize> {
    let mut depth: usize = 0;
    let mut found = Vec::new();
    for (i, c) in Unquoted::new(text, quote) {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 && !text[..i].ends_with('\\') => found.push(i),
            _ => {}
        }
    }
    found
}

/// Byte indices of every top-level `key: value` separator: a top-level `:`
/// followed by a space or the end of the text.
pub(crate) fn separators(text: &str, quote: char) -> Vec<usize> {
    let bytes = text.as_bytes();
    top_level_colons(text, quote)
        .into_iter()
        .filter(|&i| matches!(bytes.get(i + 1), None | Some(b' ')))
        .collect()
}

/// The single top-level separator of a line, if any. A line with more than
/// one top-level `:` is malformed, whatever follows each of them.
pub(crate) fn find_separator(text: &str, quote: char, location: &SourceInfo) -> Result<Option<usize>> {
    if top_level_colons(text, quote).len() > 1 {
        return Err(Error::structural(
            "More than one unquoted `:` on a line; quote the value",
            location.clone(),
        ));
    }
    Ok(separators(text, quote).first().copied())
}

/// Every `[`/`{` outside quotes must be closed by its matching bracket.
pub(crate) fn check_brackets(text: &str, quote: char, location: &SourceInfo) -> Result<()> {
    let mut stack = Vec::new();
    let mut scanner = Unquoted::new(text, quote);
    for (_, c) in scanner.by_ref() {
        match c {
            '[' | '{' => stack.push(c),
            ']' | '}' => {
                let open = if c == ']' { '[' } else { '{' };
                if stack.pop() != Some(open) {
                    return Err(Error::structural(
                        format!("Unbalanced `{}`", c),
                        location.clone(),
                    ));
                }
            }
            _ => {}
        }
    }
    if let Some(open) = stack.pop() {
        return Err(Error::structural(
            format!("Unclosed `{}`", open),
            location.clone(),
        ));
    }
    if scanner.unterminated {
        return Err(Error::structural(
            "Unterminated quoted scalar",
            location.clone(),
        ));
    }
    Ok(())
}

/// Split the inside of a flow collection on top-level commas.
pub fn split_flow_items(inner: &str, quote: char) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    for (i, c) in Unquoted::new(inner, quote) {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() || !items.is_empty() {
        items.push(last);
    }
    items
}

/// Block scalar chomping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Chomp {
    /// Keep a single trailing line break (`|`, `>`, `|+`, `>+`).
    Clip,
    /// No trailing line break (`|-`, `>-`).
    Strip,
}

/// The lexical shape of a value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'a> {
    Empty,
    Plain(&'a str),
    Quoted(String),
    FlowSeq(&'a str),
    FlowMap(&'a str),
    Anchor { name: &'a str, rest: &'a str },
    Alias(&'a str),
    Block { folded: bool, chomp: Chomp },
}

/// Tokenize a value (the text after `key: ` or `- `).
pub(crate) fn value_token<'a>(text: &'a str, quote: char, location: &SourceInfo) -> Result<Token<'a>> {
    let Some(first) = text.chars().next() else {
        return Ok(Token::Empty);
    };

    if first == quote {
        let (inner, end) = quoted_span(text, quote).ok_or_else(|| {
            Error::structural("Unterminated quoted scalar", location.clone())
        })?;
        if end != text.len() {
            return Err(Error::structural(
                "Unexpected text after closing quote",
                location.clone(),
            ));
        }
        return Ok(Token::Quoted(unescape(inner, quote)));
    }

    match first {
        '[' | '{' => {
            let close = if first == '[' { ']' } else { '}' };
            if matching_bracket(text, quote) != Some(text.len() - 1) {
                return Err(Error::structural(
                    format!("Inline flow value is not closed by its matching `{}`", close),
                    location.clone(),
                ));
            }
            if first == '[' {
                Ok(Token::FlowSeq(text))
            } else {
                Ok(Token::FlowMap(text))
            }
        }
        '&' => {
            let body = &text[1..];
            let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
            let name = &body[..name_end];
            if name.is_empty() {
                return Err(Error::structural("Anchor `&` needs a name", location.clone()));
            }
            let rest = body[name_end..].trim_start();
            if rest.starts_with('&') {
                return Err(Error::structural(
                    "A value can carry only one anchor",
                    location.clone(),
                ));
            }
            Ok(Token::Anchor { name, rest })
        }
        '*' => {
            let name = &text[1..];
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(Error::structural(
                    "Alias `*` must be followed by a single anchor name",
                    location.clone(),
                ));
            }
            Ok(Token::Alias(name))
        }
        '|' | '>' => {
            let chomp = match &text[1..] {
                "" | "+" => Chomp::Clip,
                "-" => Chomp::Strip,
                _ => {
                    return Err(Error::structural(
                        format!("Value starts with reserved character `{}`", first),
                        location.clone(),
                    ));
                }
            };
            Ok(Token::Block {
                folded: first == '>',
                chomp,
            })
        }
        c if RESERVED_VALUE_STARTS.contains(&c) && !is_signed_number(text) => Err(Error::structural(
            format!("Value starts with reserved character `{}`; quote it", c),
            location.clone(),
        )),
        _ => Ok(Token::Plain(text)),
    }
}

/// Inner text and end index (exclusive) of a quoted scalar at the start of `text`.
fn quoted_span(text: &str, quote: char) -> Option<(&str, usize)> {
    let mut chars = text.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Some((&text[quote.len_utf8()..i], i + c.len_utf8()));
        }
    }
    None
}

/// Index of the bracket closing the one at the start of `text`.
fn matching_bracket(text: &str, quote: char) -> Option<usize> {
    let mut depth: usize = 0;
    for (i, c) in Unquoted::new(text, quote) {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Unquote a key, if it is quoted.
pub(crate) fn unquote_key(key: &str, quote: char) -> String {
    match quoted_span(key, quote) {
        Some((inner, end)) if key.starts_with(quote) && end == key.len() => unescape(inner, quote),
        _ => key.to_string(),
    }
}

/// Resolve backslash escapes inside a quoted scalar.
pub fn unescape(inner: &str, quote: char) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) if other == quote => out.push(quote),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Quote `text`, escaping the quote character, backslashes and control
/// characters. The inverse of [`unescape`].
pub fn quote_scalar(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if c == quote => {
                out.push('\\');
                out.push(quote);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceInfo {
        SourceInfo::default()
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("key: value # note", '"'), "key: value ");
        assert_eq!(strip_comment("# whole line", '"'), "");
        assert_eq!(strip_comment("key: \"a # b\"", '"'), "key: \"a # b\"");
        assert_eq!(strip_comment("key: a#b", '"'), "key: a#b");
        assert_eq!(strip_comment("key: \"a \\\" # b\" # c", '"'), "key: \"a \\\" # b\" ");
    }

    #[test]
    fn test_separators() {
        assert_eq!(separators("key: value", '"'), vec![3]);
        assert_eq!(separators("key:", '"'), vec![3]);
        assert_eq!(separators("url: http://x", '"'), vec![3]);
        assert_eq!(separators("\"a: b\": c", '"'), vec![6]);
        assert_eq!(separators("k: {a: 1}", '"'), vec![1]);
        assert!(find_separator("a: b: c", '"', &loc()).is_err());
        assert_eq!(find_separator("plain", '"', &loc()).unwrap(), None);
    }

    #[test]
    fn test_every_extra_colon_is_an_error() {
        assert!(find_separator("url: http://x", '"', &loc()).is_err());
        assert!(find_separator("url: b:c", '"', &loc()).is_err());
        assert!(find_separator("time: 12:30", '"', &loc()).is_err());
        assert_eq!(find_separator("url: \"http://x\"", '"', &loc()).unwrap(), Some(3));
        assert_eq!(find_separator("url: a\\:b", '"', &loc()).unwrap(), Some(3));
        assert_eq!(find_separator("k: {a: 1, b: 2}", '"', &loc()).unwrap(), Some(1));
    }

    #[test]
    fn test_check_brackets() {
        assert!(check_brackets("k: [a, {b: c}]", '"', &loc()).is_ok());
        assert!(check_brackets("k: [a", '"', &loc()).is_err());
        assert!(check_brackets("k: a]", '"', &loc()).is_err());
        assert!(check_brackets("k: [a}", '"', &loc()).is_err());
        assert!(check_brackets("k: \"[\"", '"', &loc()).is_ok());
        assert!(check_brackets("k: \"open", '"', &loc()).is_err());
    }

    #[test]
    fn test_value_tokens() {
        assert_eq!(value_token("", '"', &loc()).unwrap(), Token::Empty);
        assert_eq!(value_token("abc", '"', &loc()).unwrap(), Token::Plain("abc"));
        assert_eq!(
            value_token("\"a\\\"b\"", '"', &loc()).unwrap(),
            Token::Quoted("a\"b".into())
        );
        assert_eq!(value_token("[1, 2]", '"', &loc()).unwrap(), Token::FlowSeq("[1, 2]"));
        assert_eq!(value_token("{a: 1}", '"', &loc()).unwrap(), Token::FlowMap("{a: 1}"));
        assert_eq!(
            value_token("&base", '"', &loc()).unwrap(),
            Token::Anchor { name: "base", rest: "" }
        );
        assert_eq!(value_token("*base", '"', &loc()).unwrap(), Token::Alias("base"));
        assert_eq!(
            value_token("|-", '"', &loc()).unwrap(),
            Token::Block { folded: false, chomp: Chomp::Strip }
        );
        assert_eq!(value_token("-12.5", '"', &loc()).unwrap(), Token::Plain("-12.5"));
    }

    #[test]
    fn test_value_token_errors() {
        assert!(value_token("[a] b", '"', &loc()).is_err());
        assert!(value_token("\"open", '"', &loc()).is_err());
        assert!(value_token("\"a\" b", '"', &loc()).is_err());
        assert!(value_token("@home", '"', &loc()).is_err());
        assert!(value_token("-x", '"', &loc()).is_err());
        assert!(value_token(">x", '"', &loc()).is_err());
        assert!(value_token("&", '"', &loc()).is_err());
        assert!(value_token("* a", '"', &loc()).is_err());
    }

    #[test]
    fn test_split_flow_items() {
        assert_eq!(split_flow_items("a, b ,c", '"'), vec!["a", "b", "c"]);
        assert_eq!(split_flow_items("\"a,b\", [c, d]", '"'), vec!["\"a,b\"", "[c, d]"]);
        assert!(split_flow_items("", '"').is_empty());
        assert!(split_flow_items("   ", '"').is_empty());
    }

    #[test]
    fn test_quote_roundtrip_escapes() {
        let text = "say \"hi\"\\\n";
        let quoted = quote_scalar(text, '"');
        assert_eq!(quoted, "\"say \\\"hi\\\"\\\\\\n\"");
        assert_eq!(unescape(&quoted[1..quoted.len() - 1], '"'), text);
    }

    #[test]
    fn test_prepare_lines_rejects_tabs() {
        let err = prepare_lines(&["---", "a:\tb"], '"', None).unwrap_err();
        assert!(err.to_string().contains("Tab"));
        assert_eq!(err.location().unwrap().line, 2);
    }

    #[test]
    fn test_prepare_lines_drops_blank_and_comment_lines() {
        let lines = prepare_lines(&["---", "", "   ", "# c", "  a: 1 # x"], '"', None).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].indent, 2);
        assert_eq!(lines[1].content, "a: 1");
        assert_eq!(lines[1].number, 5);
    }

    #[test]
    fn test_document_body() {
        let lines = prepare_lines(&["---", "a: 1", "..."], '"', None).unwrap();
        assert_eq!(document_body(lines, None).unwrap().len(), 1);

        let lines = prepare_lines(&["a: 1"], '"', None).unwrap();
        assert!(document_body(lines, None).is_err());

        let lines = prepare_lines(&["---", "a: 1", "---", "b: 2"], '"', None).unwrap();
        assert!(document_body(lines, None).is_err());
    }

    #[test]
    fn test_header_must_be_the_first_line() {
        let lines = prepare_lines(&["# hi", "---", "a: 1"], '"', None).unwrap();
        let err = document_body(lines, None).unwrap_err();
        assert_eq!(err.location().unwrap().line, 1);

        let lines = prepare_lines(&["", "---", "a: 1"], '"', None).unwrap();
        assert!(document_body(lines, None).is_err());

        let lines = prepare_lines(&["--- # start", "a: 1"], '"', None).unwrap();
        assert!(document_body(lines, None).is_err());
    }
}
