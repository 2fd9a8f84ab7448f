//! Binding capability: how the codec constructs objects and reads and
//! writes their members by name.

use crate::error::BindingError;
use crate::value::{Object, PrimitiveArray, ScalarKind, Value};
use indexmap::IndexMap;
use std::collections::HashMap;

static NULL: Value = Value::Null;

/// Construct objects and access their members by name.
///
/// The codec never looks inside an [`Object`] on its own; every read and
/// write goes through an accessor so that hosts can enforce their own class
/// layouts.
pub trait Accessor {
    /// Create an empty instance of `class`.
    fn construct(&self, class: &str) -> Result<Object, BindingError>;

    /// Read a member. Unset members read as [`Value::Null`].
    fn get<'a>(&self, object: &'a Object, member: &str) -> Result<&'a Value, BindingError>;

    /// Write a member.
    fn set(&self, object: &mut Object, member: &str, value: Value) -> Result<(), BindingError>;
}

/// Accepts any class and any member. Values are stored as decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicAccessor;

impl Accessor for DynamicAccessor {
    fn construct(&self, class: &str) -> Result<Object, BindingError> {
        Ok(Object::new(class))
    }

    fn get<'a>(&self, object: &'a Object, member: &str) -> Result<&'a Value, BindingError> {
        Ok(object.get(member).unwrap_or(&NULL))
    }

    fn set(&self, object: &mut Object, member: &str, value: Value) -> Result<(), BindingError> {
        object.set(member, value);
        Ok(())
    }
}

/// Declared kind of a class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    String,
    Integer,
    Number,
    Boolean,
    Date,
    Time,
    DateTime,
    /// Fixed-size array of one scalar kind
    Array(ScalarKind),
    /// Ordered list of objects or values
    List,
    Object,
}

impl MemberKind {
    fn name(&self) -> String {
        match self {
            MemberKind::String => "string".into(),
            MemberKind::Integer => "integer".into(),
            MemberKind::Number => "number".into(),
            MemberKind::Boolean => "boolean".into(),
            MemberKind::Date => "date".into(),
            MemberKind::Time => "time".into(),
            MemberKind::DateTime => "datetime".into(),
            MemberKind::Array(kind) => format!("{}[]", kind),
            MemberKind::List => "list".into(),
            MemberKind::Object => "object".into(),
        }
    }

    /// Coerce `value` into this kind, or hand it back unchanged on mismatch.
    fn coerce(&self, value: Value) -> Result<Value, Value> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (MemberKind::String, Value::String(s)) => Ok(Value::String(s)),
            (MemberKind::String, Value::Date(d)) => Ok(Value::String(d.to_string())),
            (MemberKind::String, Value::Time(t)) => Ok(Value::String(t.to_string())),
            (MemberKind::String, Value::DateTime(dt)) => {
                Ok(Value::String(crate::format::format_datetime(&dt)))
            }
            (MemberKind::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
            (MemberKind::Number, Value::Number(n)) => Ok(Value::Number(n)),
            (MemberKind::Number, Value::Integer(i)) => Ok(Value::Number(i as f64)),
            (MemberKind::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
            (MemberKind::Date, Value::Date(d)) => Ok(Value::Date(d)),
            (MemberKind::Time, Value::Time(t)) => Ok(Value::Time(t)),
            (MemberKind::DateTime, Value::DateTime(dt)) => Ok(Value::DateTime(dt)),
            (MemberKind::DateTime, Value::Date(d)) => Ok(Value::DateTime(
                d.and_time(chrono::NaiveTime::MIN).and_utc(),
            )),
            (MemberKind::Array(kind), Value::Array(a)) if a.kind() == *kind => Ok(Value::Array(a)),
            (MemberKind::Array(kind), Value::List(items)) => {
                let staged = items.clone();
                PrimitiveArray::from_values(*kind, items)
                    .map(Value::Array)
                    .map_err(|_| Value::List(staged))
            }
            (MemberKind::List, Value::List(items)) => Ok(Value::List(items)),
            (MemberKind::List, Value::Array(a)) => Ok(Value::List(a.values())),
            (MemberKind::Object, Value::Object(o)) => Ok(Value::Object(o)),
            (_, other) => Err(other),
        }
    }
}

/// Member table of one class.
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    members: IndexMap<String, MemberKind>,
}

impl ClassDef {
    /// Declare a member.
    pub fn member(mut self, name: impl Into<String>, kind: MemberKind) -> Self {
        self.members.insert(name.into(), kind);
        self
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, MemberKind)> {
        self.members.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}

/// Per-class member tables, registered once and shared read-only.
///
/// # Example
///
/// ```rust
/// use yamlbind::{Accessor, ClassRegistry, MemberKind, ScalarKind};
///
/// let registry = ClassRegistry::builder()
///     .class("Person", |c| {
///         c.member("name", MemberKind::String)
///             .member("tags", MemberKind::Array(ScalarKind::String))
///     })
///     .build();
///
/// let person = registry.construct("Person").unwrap();
/// assert!(registry.get(&person, "name").unwrap().is_null());
/// assert!(registry.get(&person, "age").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassDef>,
}

impl ClassRegistry {
    pub fn builder() -> ClassRegistryBuilder {
        ClassRegistryBuilder::default()
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    fn lookup(&self, class: &str) -> Result<&ClassDef, BindingError> {
        self.classes
            .get(class)
            .ok_or_else(|| BindingError::UnknownClass {
                class: class.to_string(),
            })
    }

    fn member_kind(&self, class: &str, member: &str) -> Result<MemberKind, BindingError> {
        self.lookup(class)?
            .members
            .get(member)
            .copied()
            .ok_or_else(|| BindingError::UnknownMember {
                class: class.to_string(),
                member: member.to_string(),
            })
    }
}

impl Accessor for ClassRegistry {
    fn construct(&self, class: &str) -> Result<Object, BindingError> {
        let def = self.lookup(class)?;
        let mut object = Object::new(class);
        for name in def.members.keys() {
            object.set(name.clone(), Value::Null);
        }
        Ok(object)
    }

    fn get<'a>(&self, object: &'a Object, member: &str) -> Result<&'a Value, BindingError> {
        self.member_kind(&object.class, member)?;
        Ok(object.get(member).unwrap_or(&NULL))
    }

    fn set(&self, object: &mut Object, member: &str, value: Value) -> Result<(), BindingError> {
        let kind = self.member_kind(&object.class, member)?;
        let value = kind
            .coerce(value)
            .map_err(|rejected| BindingError::UnsupportedType {
                class: object.class.clone(),
                member: member.to_string(),
                expected: kind.name(),
                got: rejected.kind_name().to_string(),
            })?;
        object.set(member, value);
        Ok(())
    }
}

/// Builder for [`ClassRegistry`].
#[derive(Debug, Default)]
pub struct ClassRegistryBuilder {
    classes: HashMap<String, ClassDef>,
}

impl ClassRegistryBuilder {
    /// Register a class, declaring its members in the closure.
    pub fn class(
        mut self,
        name: impl Into<String>,
        members: impl FnOnce(ClassDef) -> ClassDef,
    ) -> Self {
        self.classes
            .insert(name.into(), members(ClassDef::default()));
        self
    }

    pub fn build(self) -> ClassRegistry {
        ClassRegistry {
            classes: self.classes,
        }
    }
}
