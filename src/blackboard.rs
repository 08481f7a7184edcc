//! Typed, layered parameter store.
//!
//! Predicates do not own the values they compare. They hold [`Param`] handles obtained from a
//! [`Blackboard`], and the host writes fresh values into those handles between ticks. A blackboard
//! may have a parent; lookups that miss locally fall through to it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
        };

        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f32),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric view of the value. Integers are widened to floats.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Int(value) => Some(*value as f32),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlackboardError {
    #[error("Blackboard entry names must not be empty")]
    EmptyName,

    #[error("Entry \"{name}\" holds a {expected} value, cannot store a {found}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },
}

#[derive(Debug)]
struct Entry {
    name: String,
    value: RefCell<Value>,
}

/// Shared handle to a single blackboard entry.
///
/// Cloning the handle does not copy the value: every clone observes writes made through any other
/// clone or through the owning blackboard.
#[derive(Clone, Debug)]
pub struct Param(Rc<Entry>);

impl Param {
    fn new(name: &str, value: Value) -> Self {
        Self(Rc::new(Entry {
            name: name.to_string(),
            value: RefCell::new(value),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> ValueKind {
        self.0.value.borrow().kind()
    }

    pub fn get(&self) -> Value {
        self.0.value.borrow().clone()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.0.value.borrow().as_bool()
    }

    pub fn as_float(&self) -> Option<f32> {
        self.0.value.borrow().as_float()
    }

    /// Overwrite the value. The kind of an entry is fixed when it is first created.
    pub fn set<V: Into<Value>>(&self, value: V) -> Result<(), BlackboardError> {
        let value = value.into();
        let expected = self.kind();

        if value.kind() != expected {
            return Err(BlackboardError::TypeMismatch {
                name: self.name().to_string(),
                expected,
                found: value.kind(),
            });
        }

        *self.0.value.borrow_mut() = value;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Blackboard {
    entries: HashMap<String, Param>,
    parent: Option<Rc<Blackboard>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Rc<Blackboard>) -> Self {
        Self {
            entries: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn parent(&self) -> Option<&Blackboard> {
        self.parent.as_deref()
    }

    /// Insert a new local entry or overwrite an existing one.
    ///
    /// Entries inherited from the parent are never written through; setting a name the parent
    /// defines creates a local entry that shadows it.
    pub fn set<S, V>(&mut self, name: S, value: V) -> Result<Param, BlackboardError>
    where
        S: AsRef<str>,
        V: Into<Value>,
    {
        let name = name.as_ref();

        if name.is_empty() {
            return Err(BlackboardError::EmptyName);
        }

        match self.entries.get(name) {
            Some(param) => {
                param.set(value)?;
                Ok(param.clone())
            }
            None => {
                let param = Param::new(name, value.into());
                self.entries.insert(name.to_string(), param.clone());
                Ok(param)
            }
        }
    }

    /// Look an entry up locally, then in each ancestor.
    pub fn get(&self, name: &str) -> Option<Param> {
        match self.entries.get(name) {
            Some(param) => Some(param.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.get(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of the entries defined on this blackboard, excluding inherited ones.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
