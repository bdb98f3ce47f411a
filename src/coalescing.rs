//! Value conversion policies.
//!
//! Every function argument passes through the active [`Coalescer`] before it
//! reaches the native implementation. A failed conversion is not fatal: it
//! tells the dispatcher that a form does not match, so the next form is tried.
//!
//! | policy | cross-type conversions | null |
//! |---|---|---|
//! | [`Pedantic`] | none | zero/empty value of every type |
//! | [`Strict`] | lossless int <-> float only | `false`, `""`, `[]`, `{}`; never a number |
//! | [`Humane`] | numbers, strings and bools interconvert | zero/empty value of every type |

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::value::{Map, Number, Value};

/// A value could not be converted under a given policy.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {from} to {target} ({policy} coalescing)")]
pub struct CoercionError {
    pub from: String,
    pub target: &'static str,
    pub policy: &'static str,
}

/// Largest integer magnitude a float represents exactly.
const MAX_SAFE_FLOAT_INT: i64 = 1 << 53;

pub trait Coalescer: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn to_bool(&self, value: &Value) -> Result<bool, CoercionError>;
    fn to_int64(&self, value: &Value) -> Result<i64, CoercionError>;
    fn to_float64(&self, value: &Value) -> Result<f64, CoercionError>;
    fn to_number(&self, value: &Value) -> Result<Number, CoercionError>;
    fn to_string(&self, value: &Value) -> Result<String, CoercionError>;
    fn to_vector(&self, value: &Value) -> Result<Vec<Value>, CoercionError>;
    fn to_object(&self, value: &Value) -> Result<Map, CoercionError>;

    fn error(&self, value: &Value, target: &'static str) -> CoercionError {
        CoercionError {
            from: value.type_name().to_string(),
            target,
            policy: self.name(),
        }
    }
}

/// Looks up a policy by its name.
pub fn by_name(name: &str) -> Option<Arc<dyn Coalescer>> {
    match name {
        "strict" => Some(Arc::new(Strict)),
        "pedantic" => Some(Arc::new(Pedantic)),
        "humane" => Some(Arc::new(Humane)),
        _ => None,
    }
}

fn float_to_int(n: f64) -> Option<i64> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

fn int_to_float(n: i64) -> Option<f64> {
    if (-MAX_SAFE_FLOAT_INT..=MAX_SAFE_FLOAT_INT).contains(&n) {
        Some(n as f64)
    } else {
        None
    }
}

/// Exact types only; null becomes the zero value of any target.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pedantic;

impl Coalescer for Pedantic {
    fn name(&self) -> &'static str {
        "pedantic"
    }

    fn to_bool(&self, value: &Value) -> Result<bool, CoercionError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            other => Err(self.error(other, "bool")),
        }
    }

    fn to_int64(&self, value: &Value) -> Result<i64, CoercionError> {
        match value {
            Value::Null => Ok(0),
            Value::Int(n) => Ok(*n),
            other => Err(self.error(other, "int")),
        }
    }

    fn to_float64(&self, value: &Value) -> Result<f64, CoercionError> {
        match value {
            Value::Null => Ok(0.0),
            Value::Float(n) => Ok(*n),
            other => Err(self.error(other, "float")),
        }
    }

    fn to_number(&self, value: &Value) -> Result<Number, CoercionError> {
        match value {
            Value::Null => Ok(Number::Int(0)),
            Value::Int(n) => Ok(Number::Int(*n)),
            Value::Float(n) => Ok(Number::Float(*n)),
            other => Err(self.error(other, "number")),
        }
    }

    fn to_string(&self, value: &Value) -> Result<String, CoercionError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s.clone()),
            other => Err(self.error(other, "string")),
        }
    }

    fn to_vector(&self, value: &Value) -> Result<Vec<Value>, CoercionError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Vector(v) => Ok(v.clone()),
            other => Err(self.error(other, "vector")),
        }
    }

    fn to_object(&self, value: &Value) -> Result<Map, CoercionError> {
        match value {
            Value::Null => Ok(Map::new()),
            Value::Object(o) => Ok(o.clone()),
            other => Err(self.error(other, "object")),
        }
    }
}

/// Natural conversions only. Null is not a number.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl Coalescer for Strict {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn to_bool(&self, value: &Value) -> Result<bool, CoercionError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            other => Err(self.error(other, "bool")),
        }
    }

    fn to_int64(&self, value: &Value) -> Result<i64, CoercionError> {
        match value {
            Value::Int(n) => Ok(*n),
            Value::Float(n) => float_to_int(*n).ok_or_else(|| self.error(value, "int")),
            other => Err(self.error(other, "int")),
        }
    }

    fn to_float64(&self, value: &Value) -> Result<f64, CoercionError> {
        match value {
            Value::Float(n) => Ok(*n),
            Value::Int(n) => int_to_float(*n).ok_or_else(|| self.error(value, "float")),
            other => Err(self.error(other, "float")),
        }
    }

    fn to_number(&self, value: &Value) -> Result<Number, CoercionError> {
        match value {
            Value::Int(n) => Ok(Number::Int(*n)),
            Value::Float(n) => Ok(Number::Float(*n)),
            other => Err(self.error(other, "number")),
        }
    }

    fn to_string(&self, value: &Value) -> Result<String, CoercionError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s.clone()),
            other => Err(self.error(other, "string")),
        }
    }

    fn to_vector(&self, value: &Value) -> Result<Vec<Value>, CoercionError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Vector(v) => Ok(v.clone()),
            other => Err(self.error(other, "vector")),
        }
    }

    fn to_object(&self, value: &Value) -> Result<Map, CoercionError> {
        match value {
            Value::Null => Ok(Map::new()),
            Value::Object(o) => Ok(o.clone()),
            other => Err(self.error(other, "object")),
        }
    }
}

/// Converts whenever a reasonable person would.
#[derive(Debug, Clone, Copy, Default)]
pub struct Humane;

impl Humane {
    fn parse_number(&self, value: &Value, s: &str) -> Result<Number, CoercionError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Number::Int(0));
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Number::Int(n));
        }
        s.parse::<f64>()
            .map(Number::Float)
            .map_err(|_| self.error(value, "number"))
    }
}

impl Coalescer for Humane {
    fn name(&self) -> &'static str {
        "humane"
    }

    fn to_bool(&self, value: &Value) -> Result<bool, CoercionError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Int(n) => Ok(*n != 0),
            Value::Float(n) => Ok(*n != 0.0),
            Value::String(s) => Ok(!matches!(s.as_str(), "" | "0" | "false")),
            Value::Vector(v) => Ok(!v.is_empty()),
            Value::Object(o) => Ok(!o.is_empty()),
            other => Err(self.error(other, "bool")),
        }
    }

    fn to_int64(&self, value: &Value) -> Result<i64, CoercionError> {
        match self.to_number(value) {
            Ok(Number::Int(n)) => Ok(n),
            Ok(Number::Float(n)) => float_to_int(n).ok_or_else(|| self.error(value, "int")),
            Err(_) => Err(self.error(value, "int")),
        }
    }

    fn to_float64(&self, value: &Value) -> Result<f64, CoercionError> {
        match self.to_number(value) {
            Ok(n) => Ok(n.as_f64()),
            Err(_) => Err(self.error(value, "float")),
        }
    }

    fn to_number(&self, value: &Value) -> Result<Number, CoercionError> {
        match value {
            Value::Null => Ok(Number::Int(0)),
            Value::Bool(b) => Ok(Number::Int(i64::from(*b))),
            Value::Int(n) => Ok(Number::Int(*n)),
            Value::Float(n) => Ok(Number::Float(*n)),
            Value::String(s) => self.parse_number(value, s),
            other => Err(self.error(other, "number")),
        }
    }

    fn to_string(&self, value: &Value) -> Result<String, CoercionError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(n) => Ok(n.to_string()),
            Value::String(s) => Ok(s.clone()),
            other => Err(self.error(other, "string")),
        }
    }

    fn to_vector(&self, value: &Value) -> Result<Vec<Value>, CoercionError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Vector(v) => Ok(v.clone()),
            Value::Object(o) if o.is_empty() => Ok(Vec::new()),
            other => Err(self.error(other, "vector")),
        }
    }

    fn to_object(&self, value: &Value) -> Result<Map, CoercionError> {
        match value {
            Value::Null => Ok(Map::new()),
            Value::Object(o) => Ok(o.clone()),
            Value::Vector(v) if v.is_empty() => Ok(Map::new()),
            other => Err(self.error(other, "object")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<(&'static str, Value)> {
        vec![
            ("null", Value::Null),
            ("zero", Value::Int(0)),
            ("empty string", Value::String(String::new())),
            ("empty vector", Value::Vector(vec![])),
            ("empty object", Value::Object(Map::new())),
            ("false", Value::Bool(false)),
        ]
    }

    /// Expected outcome per sample, in the order of `samples()`.
    /// `None` means the conversion must fail.
    fn check<T: PartialEq + fmt::Debug>(
        policy: &dyn Coalescer,
        target: &str,
        convert: impl Fn(&Value) -> Result<T, CoercionError>,
        expected: [Option<T>; 6],
    ) {
        for ((label, value), want) in samples().into_iter().zip(expected) {
            let got = convert(&value).ok();
            assert_eq!(got, want, "{} {target} of {label}", policy.name());
        }
    }

    #[test]
    fn test_strict_table() {
        let c = Strict;
        check(&c, "bool", |v| c.to_bool(v), [Some(false), None, None, None, None, Some(false)]);
        check(&c, "int", |v| c.to_int64(v), [None, Some(0), None, None, None, None]);
        check(&c, "float", |v| c.to_float64(v), [None, Some(0.0), None, None, None, None]);
        check(&c, "string", |v| c.to_string(v), [Some(String::new()), None, Some(String::new()), None, None, None]);
        check(&c, "vector", |v| c.to_vector(v), [Some(vec![]), None, None, Some(vec![]), None, None]);
        check(&c, "object", |v| c.to_object(v), [Some(Map::new()), None, None, None, Some(Map::new()), None]);
        check(&c, "number", |v| c.to_number(v), [None, Some(Number::Int(0)), None, None, None, None]);
    }

    #[test]
    fn test_pedantic_table() {
        let c = Pedantic;
        check(&c, "bool", |v| c.to_bool(v), [Some(false), None, None, None, None, Some(false)]);
        check(&c, "int", |v| c.to_int64(v), [Some(0), Some(0), None, None, None, None]);
        check(&c, "float", |v| c.to_float64(v), [Some(0.0), None, None, None, None, None]);
        check(&c, "string", |v| c.to_string(v), [Some(String::new()), None, Some(String::new()), None, None, None]);
        check(&c, "vector", |v| c.to_vector(v), [Some(vec![]), None, None, Some(vec![]), None, None]);
        check(&c, "object", |v| c.to_object(v), [Some(Map::new()), None, None, None, Some(Map::new()), None]);
        check(&c, "number", |v| c.to_number(v), [Some(Number::Int(0)), Some(Number::Int(0)), None, None, None, None]);
    }

    #[test]
    fn test_humane_table() {
        let c = Humane;
        check(&c, "bool", |v| c.to_bool(v), [Some(false); 6]);
        check(&c, "int", |v| c.to_int64(v), [Some(0), Some(0), Some(0), None, None, Some(0)]);
        check(&c, "float", |v| c.to_float64(v), [Some(0.0), Some(0.0), Some(0.0), None, None, Some(0.0)]);
        check(
            &c,
            "string",
            |v| c.to_string(v),
            [
                Some(String::new()),
                Some("0".to_string()),
                Some(String::new()),
                None,
                None,
                Some("false".to_string()),
            ],
        );
        check(&c, "vector", |v| c.to_vector(v), [Some(vec![]), None, None, Some(vec![]), Some(vec![]), None]);
        check(&c, "object", |v| c.to_object(v), [Some(Map::new()), None, None, Some(Map::new()), Some(Map::new()), None]);
    }

    #[test]
    fn test_strict_rejects_zero_as_bool_but_humane_accepts() {
        assert!(Strict.to_bool(&Value::Int(0)).is_err());
        assert_eq!(Humane.to_bool(&Value::Int(0)), Ok(false));
    }

    #[test]
    fn test_strict_numeric_widening_is_lossless_only() {
        assert_eq!(Strict.to_int64(&Value::Float(3.0)), Ok(3));
        assert!(Strict.to_int64(&Value::Float(3.5)).is_err());
        assert_eq!(Strict.to_float64(&Value::Int(7)), Ok(7.0));
        assert!(Strict.to_float64(&Value::Int(i64::MAX)).is_err());
        assert!(Pedantic.to_float64(&Value::Int(7)).is_err());
    }

    #[test]
    fn test_float_narrowing_edges() {
        let two_pow_63 = Value::Float(9223372036854775808.0);
        assert!(Strict.to_int64(&two_pow_63).is_err());
        assert!(Humane.to_int64(&two_pow_63).is_err());

        let min = Value::Float(-9223372036854775808.0);
        assert_eq!(Strict.to_int64(&min), Ok(i64::MIN));
    }

    #[test]
    fn test_humane_text_conversions() {
        assert_eq!(Humane.to_int64(&Value::String(" 42 ".into())), Ok(42));
        assert_eq!(Humane.to_number(&Value::String("1.5".into())), Ok(Number::Float(1.5)));
        assert!(Humane.to_int64(&Value::String("1.5".into())).is_err());
        assert!(Humane.to_number(&Value::String("abc".into())).is_err());
        assert_eq!(Humane.to_bool(&Value::String("false".into())), Ok(false));
        assert_eq!(Humane.to_bool(&Value::String("no".into())), Ok(true));
        assert_eq!(Humane.to_string(&Value::Bool(true)), Ok("true".into()));
        assert_eq!(Humane.to_int64(&Value::Bool(true)), Ok(1));
    }

    #[test]
    fn test_error_message_names_policy() {
        let err = Strict.to_bool(&Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert int to bool (strict coalescing)");
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(by_name("humane").map(|c| c.name()), Some("humane"));
        assert!(by_name("lenient").is_none());
    }
}
