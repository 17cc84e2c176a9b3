//! Dynamic values flowing through binding endpoints.
//!
//! [`Value`] is the closed union over everything an endpoint can store or
//! an expression can produce. Two comparison modes exist:
//!
//! - `PartialEq`: strict — variants must match, objects compare by
//!   reference identity.
//! - [`Value::loosely_eq`]: the propagation comparison — `Null` equals
//!   `Null`, and numeric variants compare across `Int`/`Float` so a
//!   round-tripped `42` never looks like a change against `42.0`.

use std::rc::Rc;

use crate::object::{ObjectId, ObjectRef};

/// A dynamically typed value.
#[derive(Clone)]
pub enum Value {
    /// The absent value. Distinct from "member missing" at the accessor
    /// level, but compared as equal to another `Null` during propagation.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A live object in the graph. Identity, not state, is what matters.
    Object(ObjectRef),
}

impl Value {
    /// Variant name, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Object(_) => "object",
        }
    }

    /// Whether this is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The comparison used by change propagation to suppress no-op
    /// writes: both-`Null` is equal, `Int` and `Float` compare by
    /// numeric ordering, objects by identity, everything else strictly.
    #[must_use]
    pub fn loosely_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            #[allow(clippy::cast_precision_loss)]
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => ObjectId::of(a) == ObjectId::of(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => ObjectId::of(a) == ObjectId::of(b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(o) => write!(f, "Object({:?})", ObjectId::of(o)),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Object(o) => write!(f, "<object {:?}>", ObjectId::of(o)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl<T: crate::object::Notifying + 'static> From<Rc<T>> for Value {
    fn from(v: Rc<T>) -> Self {
        Value::Object(v)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
