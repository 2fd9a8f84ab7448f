//! Rendering of codec errors for the terminal.

use std::collections::HashMap;
use yamlbind::{BindingError, Error, ErrorClass, ValidationErrorKind};

/// A tidy, structured error report.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub title: String,
    pub code: &'static str,
    pub problem: String,
    pub details: Vec<String>,
    pub hints: Vec<String>,
}

/// Texts of the files read during this run, keyed by the name that ends
/// up in error locations.
#[derive(Debug, Default)]
pub struct Sources {
    files: HashMap<String, String>,
}

impl Sources {
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.files.insert(name.into(), text.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

fn title(class: ErrorClass) -> &'static str {
    match class {
        ErrorClass::Structural => "Malformed YAML",
        ErrorClass::Reference => "Unresolved Reference",
        ErrorClass::Binding => "Schema And Classes Do Not Fit",
        ErrorClass::Validation => "YAML Validation Failed",
        ErrorClass::Io => "File Access Failed",
    }
}

/// Convert a codec error into a [`Diagnostic`].
pub fn error_to_diagnostic(error: &Error) -> Diagnostic {
    let mut details = Vec::new();

    if let Error::Validation(err) = error {
        if err.instance_path.is_empty() {
            details.push("At document root".to_string());
        } else {
            details.push(format!("At document path: `{}`", err.instance_path));
        }
    }

    if let Some(loc) = error.location() {
        match &loc.file {
            Some(file) => details.push(format!(
                "In file `{}` at line {}, column {}",
                file, loc.line, loc.col
            )),
            None => details.push(format!("At line {}, column {}", loc.line, loc.col)),
        }
    }

    Diagnostic {
        title: title(error.class()).to_string(),
        code: error.error_code(),
        problem: error.message(),
        details,
        hints: suggest_fix(error).into_iter().collect(),
    }
}

fn suggest_fix(error: &Error) -> Option<String> {
    let hint = match error {
        Error::Validation(err) => match &err.kind {
            ValidationErrorKind::MissingRequiredProperty { property } => {
                format!("Add the `{}` property to the document?", property)
            }
            ValidationErrorKind::RequiredValueEmpty { property } => {
                format!("Give `{}` a non-empty value?", property)
            }
            ValidationErrorKind::TypeMismatch { expected, .. } => {
                format!("Use a value of type {}; quote it to force a string", expected)
            }
            ValidationErrorKind::StringPatternMismatch { pattern, .. } => {
                format!("The value must contain a match for `{}`", pattern)
            }
            _ => return None,
        },
        Error::Binding(BindingError::UnknownMember { member, .. }) => {
            format!("Register `{}` on the class or add a `mapping` to the schema node?", member)
        }
        Error::Reference { name, .. } => {
            format!("Define `{}` under `definitions` or add an `&{}` anchor?", name, name)
        }
        _ => return None,
    };
    Some(hint)
}

/// Render `error` with source context when its file text is known.
pub fn render(error: &Error, sources: &Sources, color: bool) -> String {
    let diagnostic = error_to_diagnostic(error);
    if let Some(output) = render_ariadne(error, &diagnostic, sources, color) {
        return output;
    }
    render_plain(&diagnostic)
}

fn render_ariadne(
    error: &Error,
    diagnostic: &Diagnostic,
    sources: &Sources,
    color: bool,
) -> Option<String> {
    use ariadne::{Color, Config, Label, Report, ReportKind, Source};

    let loc = error.location()?;
    let file = loc.file.clone()?;
    let content = sources.get(&file)?;

    let span = loc.offset..loc.end_offset().max(loc.offset + 1);
    let mut report = Report::build(ReportKind::Error, file.clone(), loc.offset)
        .with_config(Config::default().with_color(color))
        .with_message(format!("[{}] {}", diagnostic.code, diagnostic.title))
        .with_label(
            Label::new((file.clone(), span))
                .with_message(&diagnostic.problem)
                .with_color(Color::Red),
        );
    for hint in &diagnostic.hints {
        report = report.with_help(hint);
    }

    let mut output = Vec::new();
    report
        .finish()
        .write((file, Source::from(content)), &mut output)
        .ok()?;
    String::from_utf8(output).ok()
}

/// Plain-text form: title with code, problem, details, hints.
pub fn render_plain(diagnostic: &Diagnostic) -> String {
    let mut out = format!("Error: {} ({})\n\n", diagnostic.title, diagnostic.code);
    out.push_str(&format!("Problem: {}\n\n", diagnostic.problem));

    if !diagnostic.details.is_empty() {
        for detail in &diagnostic.details {
            out.push_str(&format!("  ✖ {}\n", detail));
        }
        out.push('\n');
    }

    for hint in &diagnostic.hints {
        out.push_str(&format!("  ? {}\n", hint));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use yamlbind::Codec;

    fn validation_error() -> Error {
        let codec = Codec::new("---\nproperties:\n  name: string\nrequired: [name]\n").unwrap();
        codec.validate("---\nage: 3\n").unwrap_err()
    }

    #[test]
    fn test_missing_property_diagnostic() {
        let diagnostic = error_to_diagnostic(&validation_error());
        assert_eq!(diagnostic.title, "YAML Validation Failed");
        assert_eq!(diagnostic.code, "Y-1-10");
        assert_eq!(diagnostic.problem, "Required property 'name' is missing");
        assert_eq!(diagnostic.hints.len(), 1);
        assert!(diagnostic.hints[0].contains("`name`"));
    }

    #[test]
    fn test_plain_rendering() {
        let diagnostic = Diagnostic {
            title: "YAML Validation Failed".into(),
            code: "Y-1-15",
            problem: "Value -4 must be at least 0".into(),
            details: vec!["At document path: `age`".into()],
            hints: Vec::new(),
        };
        assert_eq!(
            render_plain(&diagnostic),
            "Error: YAML Validation Failed (Y-1-15)\n\nProblem: Value -4 must be at least 0\n\n  ✖ At document path: `age`\n\n"
        );
    }

    #[test]
    fn test_source_context_when_file_is_known() {
        let codec = Codec::new("---\nproperties:\n  age:\n    type: integer\n    minimum: 0\n").unwrap();
        let text = "---\nage: -4\n";
        let document = yamlbind_tree::parse_named(
            text,
            "person.yaml",
            codec.options(),
            yamlbind_tree::ParseMode::Data,
        )
        .unwrap();
        let err = codec.validate_tree(&document).unwrap_err();

        let mut sources = Sources::default();
        sources.add("person.yaml", text);
        let output = render(&err, &sources, false);
        assert!(output.contains("[Y-1-15] YAML Validation Failed"), "{}", output);
        assert!(output.contains("person.yaml"), "{}", output);
        assert!(output.contains("age: -4"), "{}", output);
    }

    #[test]
    fn test_falls_back_without_source() {
        let output = render(&validation_error(), &Sources::default(), false);
        assert!(output.starts_with("Error: YAML Validation Failed (Y-1-10)"));
    }
}
