//! Bound values: what the decoder produces and the encoder consumes.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Element kind of a primitive array, and of scalar members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bound value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    /// Fixed-size array of one scalar kind.
    Array(PrimitiveArray),
    /// Ordered list of objects or mixed values.
    List(Vec<Value>),
    Object(Object),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the runtime kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Scalar kind of this value, if it is one of the four primitive kinds.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Value::String(_) => Some(ScalarKind::String),
            Value::Integer(_) => Some(ScalarKind::Integer),
            Value::Number(_) => Some(ScalarKind::Number),
            Value::Boolean(_) => Some(ScalarKind::Boolean),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<PrimitiveArray> for Value {
    fn from(a: PrimitiveArray) -> Self {
        Value::Array(a)
    }
}

/// A fixed-size native array of one scalar kind. `None` elements stand for
/// `null` entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimitiveArray {
    String(Box<[Option<String>]>),
    Integer(Box<[Option<i64>]>),
    Number(Box<[Option<f64>]>),
    Boolean(Box<[Option<bool>]>),
}

impl PrimitiveArray {
    pub fn kind(&self) -> ScalarKind {
        match self {
            PrimitiveArray::String(_) => ScalarKind::String,
            PrimitiveArray::Integer(_) => ScalarKind::Integer,
            PrimitiveArray::Number(_) => ScalarKind::Number,
            PrimitiveArray::Boolean(_) => ScalarKind::Boolean,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PrimitiveArray::String(a) => a.len(),
            PrimitiveArray::Integer(a) => a.len(),
            PrimitiveArray::Number(a) => a.len(),
            PrimitiveArray::Boolean(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty array of the given kind.
    pub fn empty(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::String => PrimitiveArray::String(Box::new([])),
            ScalarKind::Integer => PrimitiveArray::Integer(Box::new([])),
            ScalarKind::Number => PrimitiveArray::Number(Box::new([])),
            ScalarKind::Boolean => PrimitiveArray::Boolean(Box::new([])),
        }
    }

    /// Elements as individual values, `null` entries as [`Value::Null`].
    pub fn values(&self) -> Vec<Value> {
        fn lift<T: Clone>(items: &[Option<T>], wrap: fn(T) -> Value) -> Vec<Value> {
            items
                .iter()
                .map(|item| item.clone().map_or(Value::Null, wrap))
                .collect()
        }
        match self {
            PrimitiveArray::String(a) => lift(a, Value::String),
            PrimitiveArray::Integer(a) => lift(a, Value::Integer),
            PrimitiveArray::Number(a) => lift(a, Value::Number),
            PrimitiveArray::Boolean(a) => lift(a, Value::Boolean),
        }
    }

    /// Convert staged values into a native array of `kind`.
    ///
    /// Integers are widened into number arrays and date-like values are
    /// rendered into string arrays. Any other mismatch returns the kind
    /// name of the offending value.
    pub fn from_values(kind: ScalarKind, values: Vec<Value>) -> Result<Self, &'static str> {
        match kind {
            ScalarKind::String => values
                .into_iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::String(s) => Ok(Some(s)),
                    Value::Date(d) => Ok(Some(d.to_string())),
                    Value::Time(t) => Ok(Some(t.to_string())),
                    Value::DateTime(dt) => Ok(Some(crate::format::format_datetime(&dt))),
                    other => Err(other.kind_name()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|v| PrimitiveArray::String(v.into_boxed_slice())),
            ScalarKind::Integer => values
                .into_iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Integer(i) => Ok(Some(i)),
                    other => Err(other.kind_name()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|v| PrimitiveArray::Integer(v.into_boxed_slice())),
            ScalarKind::Number => values
                .into_iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Number(n) => Ok(Some(n)),
                    Value::Integer(i) => Ok(Some(i as f64)),
                    other => Err(other.kind_name()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|v| PrimitiveArray::Number(v.into_boxed_slice())),
            ScalarKind::Boolean => values
                .into_iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Boolean(b) => Ok(Some(b)),
                    other => Err(other.kind_name()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|v| PrimitiveArray::Boolean(v.into_boxed_slice())),
        }
    }
}

impl<const N: usize> From<[&str; N]> for PrimitiveArray {
    fn from(items: [&str; N]) -> Self {
        PrimitiveArray::String(items.iter().map(|s| Some(s.to_string())).collect())
    }
}

impl<const N: usize> From<[i64; N]> for PrimitiveArray {
    fn from(items: [i64; N]) -> Self {
        PrimitiveArray::Integer(items.iter().copied().map(Some).collect())
    }
}

impl<const N: usize> From<[f64; N]> for PrimitiveArray {
    fn from(items: [f64; N]) -> Self {
        PrimitiveArray::Number(items.iter().copied().map(Some).collect())
    }
}

/// A bound object: a class identity plus named members in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Object {
    pub class: String,
    pub members: IndexMap<String, Value>,
}

impl Object {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            members: IndexMap::new(),
        }
    }

    /// Builder-style member assignment.
    pub fn with(mut self, member: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(member.into(), value.into());
        self
    }

    pub fn get(&self, member: &str) -> Option<&Value> {
        self.members.get(member)
    }

    pub fn set(&mut self, member: impl Into<String>, value: Value) {
        self.members.insert(member.into(), value);
    }
}
