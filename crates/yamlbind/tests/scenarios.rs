//! End-to-end scenarios through the public `Codec` API.

use pretty_assertions::assert_eq;
use yamlbind::{
    Codec, CountLimit, DynamicAccessor, Error, ErrorClass, Object, PrimitiveArray,
    ValidationErrorKind, Value, ValueType, classify,
};

const PERSON_SCHEMA: &str = r#"---
properties:
  name: string
  tags:
    type: array
    items:
      type: string[]
"#;

#[test]
fn test_person_encodes_to_canonical_text() {
    let codec = Codec::new(PERSON_SCHEMA).unwrap();
    let person = Object::new("Person")
        .with("name", "Alice")
        .with("tags", PrimitiveArray::from(["a", "b"]));

    let text = codec.encode(&person, &DynamicAccessor).unwrap();
    insta::assert_snapshot!(text, @r#"
    ---
    name: "Alice"
    tags:
      - a
      - b
    ...
    "#);
    assert_eq!(text, "---\nname: \"Alice\"\ntags:\n  - a\n  - b\n...");

    let decoded = codec.decode(&text, "Person", &DynamicAccessor).unwrap();
    assert_eq!(decoded.get("name"), Some(&Value::from("Alice")));
    assert_eq!(
        decoded.get("tags"),
        Some(&Value::Array(PrimitiveArray::from(["a", "b"])))
    );
}

#[test]
fn test_min_length() {
    let codec = Codec::new("---\nproperties:\n  code:\n    type: string\n    minLength: 3\n").unwrap();
    let err = codec.validate("---\ncode: ab\n").unwrap_err();
    let Error::Validation(err) = err else {
        panic!("expected a validation error, got {:?}", err);
    };
    assert_eq!(
        err.kind,
        ValidationErrorKind::StringLengthInvalid {
            length: 2,
            limit: CountLimit::AtLeast(3),
        }
    );
    assert!(codec.validate("---\ncode: abc\n").is_ok());
}

#[test]
fn test_item_count_bounds() {
    let codec = Codec::new(
        "---\nproperties:\n  picks:\n    type: array\n    minItems: 1\n    maxItems: 2\n    items: integer[]\n",
    )
    .unwrap();

    assert!(codec.validate("---\npicks: []\n").is_err());
    assert!(codec.validate("---\npicks: [1]\n").is_ok());
    assert!(codec.validate("---\npicks:\n  - 1\n  - 2\n").is_ok());
    let err = codec.validate("---\npicks: [1, 2, 3]\n").unwrap_err();
    assert_eq!(err.error_code(), "Y-1-13");
}

#[test]
fn test_numeric_bounds() {
    let codec = Codec::new(
        "---\nproperties:\n  low:\n    type: integer\n    minimum: 10\n  high:\n    type: number\n    exclusiveMaximum: 1.5\n",
    )
    .unwrap();
    assert!(codec.validate("---\nlow: 10\nhigh: 1.4\n").is_ok());
    assert!(codec.validate("---\nlow: 9\n").is_err());
    assert!(codec.validate("---\nhigh: 1.5\n").is_err());
}

#[test]
fn test_required_enforcement() {
    let codec = Codec::new(
        "---\nproperties:\n  name: string\n  nickname: string\nrequired:\n  - name\n",
    )
    .unwrap();
    assert!(codec.validate("---\nname: Ada\n").is_ok());

    let err = codec.validate("---\nnickname: A\n").unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(err.error_code(), "Y-1-10");
}

#[test]
fn test_pattern_is_a_search() {
    let codec = Codec::new(
        "---\nproperties:\n  sku:\n    type: string\n    pattern: \"[0-9]{3}\"\n",
    )
    .unwrap();
    assert!(codec.validate("---\nsku: ab123\n").is_ok());
    assert!(codec.validate("---\nsku: ab12\n").is_err());
}

#[test]
fn test_null_classifies_as_object() {
    assert_eq!(classify("null"), ValueType::Object);
    assert_eq!(classify(""), ValueType::Null);
    assert_eq!(classify("true"), ValueType::Boolean);
    assert_eq!(classify("-12.5"), ValueType::Number);
    assert_eq!(classify("7"), ValueType::Integer);
    assert_eq!(classify("[1,2]"), ValueType::Array);

    // An unquoted null still reads as "no value" for an optional member.
    let codec = Codec::new("---\nproperties:\n  name: string\n").unwrap();
    assert!(codec.validate("---\nname: null\n").is_ok());
}

#[test]
fn test_malformed_data_is_structural() {
    let codec = Codec::new(PERSON_SCHEMA).unwrap();
    for text in [
        "name: x\n",
        "---\nname:\tx\n",
        "---\nname: a: b\n",
        "---\ntags: [a, b\n",
        "# hi\n---\nname: x\n",
        "\n---\nname: x\n",
        "---\nname: http://x\n",
        "---\nname: b:c\n",
    ] {
        let err = codec.validate(text).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Structural, "{:?}: {}", text, err);
    }
}

#[test]
fn test_colons_inside_quotes_are_text() {
    let codec = Codec::new(PERSON_SCHEMA).unwrap();
    let decoded = codec
        .decode("---\nname: \"http://x\"\ntags:\n  - \"b:c\"\n", "Person", &DynamicAccessor)
        .unwrap();
    assert_eq!(decoded.get("name"), Some(&Value::from("http://x")));
    assert_eq!(
        decoded.get("tags"),
        Some(&Value::Array(PrimitiveArray::from(["b:c"])))
    );
}

#[test]
fn test_literal_block_keeps_blank_and_hash_lines() {
    let codec = Codec::new(PERSON_SCHEMA).unwrap();
    let decoded = codec
        .decode("---\nname: |\n  one\n\n  #two\n  three\n", "Person", &DynamicAccessor)
        .unwrap();
    assert_eq!(decoded.get("name"), Some(&Value::from("one\n\n#two\nthree\n")));
}
