//! Session claim type definitions

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Access-token payload: claim key to `{v, t}` sub-document
pub type Payload = serde_json::Map<String, Value>;

/// Opaque per-request context threaded through every claim operation
pub type UserContext = serde_json::Map<String, Value>;

/// Current wall-clock time in milliseconds since the Unix epoch
#[inline]
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A JSON scalar: string, number or boolean
///
/// Equality follows JSON value identity, so `1`, `1.0`, `"1"` and `true`
/// are four distinct primitives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(Number),
    /// String value
    String(String),
}

impl Primitive {
    /// Build a numeric primitive from a float, `None` for NaN and infinities
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Primitive::Number)
    }

    /// Borrow the string content, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Primitive::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// JSON representation
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Primitive::Bool(b) => Value::Bool(*b),
            Primitive::Number(n) => Value::Number(n.clone()),
            Primitive::String(s) => Value::String(s.clone()),
        }
    }

    /// Read a primitive from JSON; arrays, objects and null are rejected
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Primitive::Bool(*b)),
            Value::Number(n) => Some(Primitive::Number(n.clone())),
            Value::String(s) => Some(Primitive::String(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool(b) => write!(f, "{b}"),
            Primitive::Number(n) => write!(f, "{n}"),
            Primitive::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::String(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Bool(value)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Primitive::Number(value.into())
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Primitive::Number(value.into())
    }
}

impl From<u64> for Primitive {
    fn from(value: u64) -> Self {
        Primitive::Number(value.into())
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Primitive {}
    impl Sealed for Vec<super::Primitive> {}
}

/// Value shapes a claim can carry
///
/// The set is closed: a scalar [`Primitive`] or an ordered array of
/// primitives. Conversions are infallible in the writing direction so an
/// entry can never be stored half-written.
pub trait ClaimShape: sealed::Sealed + fmt::Debug + Clone + PartialEq + Send + Sync + 'static {
    /// JSON form stored under `v`
    fn to_json(&self) -> Value;

    /// Parse the JSON stored under `v`, `None` when it has another shape
    fn from_json(value: &Value) -> Option<Self>;
}

impl ClaimShape for Primitive {
    fn to_json(&self) -> Value {
        Primitive::to_json(self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        Primitive::from_json(value)
    }
}

impl ClaimShape for Vec<Primitive> {
    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(Primitive::to_json).collect())
    }

    fn from_json(value: &Value) -> Option<Self> {
        value
            .as_array()?
            .iter()
            .map(Primitive::from_json)
            .collect::<Option<Vec<_>>>()
    }
}
