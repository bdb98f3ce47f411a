use std::collections::BTreeMap;
use std::fmt;

use crate::host::Host;

/// Object payload. Keys iterate in lexicographic order, which keeps filter
/// evaluation and JSON output deterministic.
pub type Map = BTreeMap<String, Value>;

/// A runtime value used throughout the Quill language.
///
/// This type represents all JSON types with a distinction between integers
/// and floats, plus an escape hatch for opaque host data.
///
/// # Examples
///
/// ```
/// use quill_lang::{Map, Value};
///
/// let null = Value::Null;
/// let boolean = Value::Bool(true);
/// let integer = Value::Int(42);
/// let float = Value::Float(3.14);
/// let string = Value::String("hello".to_string());
///
/// let vector = Value::Vector(vec![Value::Int(1), Value::Int(2)]);
///
/// let mut obj = Map::new();
/// obj.insert("key".to_string(), Value::String("value".to_string()));
/// let object = Value::Object(obj);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON null
    Null,

    /// JSON boolean (true/false)
    Bool(bool),

    /// Integer number (preserved separately from floats)
    Int(i64),

    /// Floating-point number
    Float(f64),

    /// UTF-8 string
    String(String),

    /// Ordered list of values
    Vector(Vec<Value>),

    /// Object with string keys
    Object(Map),

    /// Opaque value owned by the embedding application
    Host(Host),
}

/// A numeric value as produced by `Coalescer::to_number`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Number::Float(_))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(n) => Value::Int(n),
            Number::Float(n) => Value::Float(n),
        }
    }
}

impl Value {
    /// Returns a human-readable type name, as reported by `type-of`.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Vector(_) => "vector",
            Value::Object(_) => "object",
            Value::Host(h) => h.type_name(),
        }
    }

    /// Null, false, zero, and empty strings/vectors/objects are empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !*b,
            Value::Int(n) => *n == 0,
            Value::Float(n) => *n == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Vector(v) => v.is_empty(),
            Value::Object(o) => o.is_empty(),
            Value::Host(_) => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Equality that treats `1` and `1.0` as the same number and compares
    /// containers element-wise with the same rule.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Vector(a), Value::Vector(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.loose_eq(vb))
            }
            _ => self == other,
        }
    }

    /// Converts to a `serde_json::Value`. Host values render through
    /// `HostValue::to_value`, or as their type name when they have none.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Vector(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Host(h) => match h.to_value() {
                Some(v) => v.to_json(),
                None => serde_json::Value::String(format!("<{}>", h.type_name())),
            },
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Vector(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Vector(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::output::to_json(self))
    }
}
