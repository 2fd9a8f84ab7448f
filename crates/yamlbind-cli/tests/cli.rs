//! Runs the `yamlbind` binary against files in a scratch directory.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SCHEMA: &str = r#"---
definitions:
  address:
    type: object
    mapping: Address
    properties:
      city: string
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
  home: *address
required: [name]
"#;

fn yamlbind(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_yamlbind"))
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn scratch(data: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("person.schema.yaml"), SCHEMA).unwrap();
    fs::write(dir.path().join("person.yaml"), data).unwrap();
    dir
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_validate_success() {
    let dir = scratch("---\nname: Ada\nage: 36\ntags: [x, y]\n");
    let output = yamlbind(
        &["validate", "--schema", "person.schema.yaml", "--input", "person.yaml"],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("✓ Validation successful"));
}

#[test]
fn test_validate_failure_shows_source() {
    let dir = scratch("---\nname: Ada\nage: -1\n");
    let output = yamlbind(
        &["validate", "--schema", "person.schema.yaml", "--input", "person.yaml"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Y-1-15"), "{}", err);
    assert!(err.contains("age: -1"), "{}", err);
}

#[test]
fn test_decode_prints_json() {
    let dir = scratch("---\nname: Ada\nhome:\n  city: Oslo\n");
    let output = yamlbind(
        &[
            "decode",
            "--schema",
            "person.schema.yaml",
            "--input",
            "person.yaml",
            "--class",
            "Person",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["class"], "Person");
    assert_eq!(json["members"]["name"], "Ada");
    assert_eq!(json["members"]["home"]["class"], "Address");
    assert_eq!(json["members"]["home"]["members"]["city"], "Oslo");
}

#[test]
fn test_check_schema_lists_nodes() {
    let dir = scratch("---\n");
    let output = yamlbind(&["check-schema", "person.schema.yaml"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("  address: Address"), "{}", out);
    assert!(out.contains("  name (string) required"), "{}", out);
    assert!(out.contains("  tags (array)"), "{}", out);
    assert!(out.contains("  home (object) -> *address"), "{}", out);
}

#[test]
fn test_parse_prints_tree() {
    let dir = scratch("---\nname: \"Ada\"\ntags:\n  - a\n");
    let output = yamlbind(&["parse", "person.yaml"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["kind"], "document");
    assert_eq!(json["children"][0]["name"], "name");
    assert_eq!(json["children"][0]["scalar"]["quoted"], true);
}

#[test]
fn test_structural_error_in_input() {
    let dir = scratch("name: Ada\n");
    let output = yamlbind(
        &["validate", "--schema", "person.schema.yaml", "--input", "person.yaml"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Y-1-01"), "{}", stderr(&output));
}

#[test]
fn test_missing_file() {
    let dir = scratch("---\n");
    let output = yamlbind(
        &["validate", "--schema", "person.schema.yaml", "--input", "absent.yaml"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to read file: absent.yaml"));
}

#[test]
fn test_bad_quote_option() {
    let dir = scratch("---\nname: Ada\n");
    let output = yamlbind(&["--quote", "`", "check-schema", "person.schema.yaml"], dir.path());
    assert_eq!(output.status.code(), Some(1));
}
