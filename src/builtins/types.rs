//! Explicit conversions. These always use humane rules, whatever
//! coalescer the script runs under.

use crate::coalescing::{Coalescer, Humane};
use crate::functions::{Form, Function, Param};
use crate::output::to_json;
use crate::value::{Number, Value};

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new("to-bool", "Converts a value to a boolean")
            .form(Form::new(&[Param::Any], |args| Ok(Value::Bool(Humane.to_bool(args.value(0)?)?)))),
        Function::new("to-int", "Converts a value to an integer, truncating floats")
            .form(Form::new(&[Param::Any], |args| {
                let value = args.value(0)?;
                match Humane.to_number(value)? {
                    Number::Int(n) => Ok(Value::Int(n)),
                    Number::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => {
                        Ok(Value::Int(f.trunc() as i64))
                    }
                    Number::Float(_) => Ok(Value::Int(Humane.to_int64(value)?)),
                }
            })),
        Function::new("to-float", "Converts a value to a float")
            .form(Form::new(&[Param::Any], |args| Ok(Value::Float(Humane.to_float64(args.value(0)?)?)))),
        Function::new("to-string", "Converts a value to a string; vectors and objects become JSON")
            .form(Form::new(&[Param::Any], |args| {
                let value = args.value(0)?;
                Ok(Value::String(Humane.to_string(value).unwrap_or_else(|_| to_json(value))))
            })),
        Function::new("type-of", "Names the type of a value")
            .form(Form::new(&[Param::Any], |args| Ok(Value::from(args.value(0)?.type_name())))),
    ]
}
