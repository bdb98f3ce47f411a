use crate::functions::{Form, Function, Param};
use crate::value::Value;

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new("len", "Number of items in a vector, keys in an object or characters in a string")
            .form(Form::new(&[Param::Vector], |args| Ok(Value::Int(args.vector(0)?.len() as i64))))
            .form(Form::new(&[Param::Object], |args| Ok(Value::Int(args.object(0)?.len() as i64))))
            .form(Form::new(&[Param::String], |args| {
                Ok(Value::Int(args.str(0)?.chars().count() as i64))
            })),
        Function::new("append", "Adds values to the end of a vector")
            .form(Form::variadic(&[Param::Vector, Param::Any], |args| {
                let mut items = args.vector(0)?.to_vec();
                items.extend(args.rest_values());
                Ok(Value::Vector(items))
            })),
        Function::new("prepend", "Adds values to the front of a vector, in the order given")
            .form(Form::variadic(&[Param::Vector, Param::Any], |args| {
                let mut items = args.rest_values();
                items.extend_from_slice(args.vector(0)?);
                Ok(Value::Vector(items))
            })),
        Function::new("reverse", "Reverses a vector or a string")
            .form(Form::new(&[Param::Vector], |args| {
                Ok(Value::Vector(args.vector(0)?.iter().rev().cloned().collect()))
            }))
            .form(Form::new(&[Param::String], |args| {
                Ok(Value::String(args.str(0)?.chars().rev().collect()))
            })),
        Function::new(
            "contains?",
            "Whether a vector holds a value, an object has a key, or a string has a substring",
        )
        .form(Form::new(&[Param::Vector, Param::Any], |args| {
            let needle = args.value(1)?;
            Ok(Value::Bool(args.vector(0)?.iter().any(|item| item.loose_eq(needle))))
        }))
        .form(Form::new(&[Param::Object, Param::String], |args| {
            Ok(Value::Bool(args.object(0)?.contains_key(args.str(1)?)))
        }))
        .form(Form::new(&[Param::String, Param::String], |args| {
            Ok(Value::Bool(args.str(0)?.contains(args.str(1)?)))
        })),
    ]
}
