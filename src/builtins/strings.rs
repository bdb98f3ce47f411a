use regex::Regex;

use super::render;
use crate::evaluator::EvalError;
use crate::functions::{Form, Function, Param};
use crate::value::Value;

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new("concat", "Joins a vector, or the remaining arguments, with a separator")
            .form(Form::new(&[Param::String, Param::Vector], |args| {
                let parts: Vec<String> = args.vector(1)?.iter().map(render).collect();
                Ok(Value::String(parts.join(args.str(0)?)))
            }))
            .form(Form::variadic(&[Param::String, Param::Any], |args| {
                let parts: Vec<String> = args.rest_values().iter().map(render).collect();
                Ok(Value::String(parts.join(args.str(0)?)))
            })),
        Function::new("split", "Splits a string on a separator")
            .form(Form::new(&[Param::String, Param::String], |args| {
                let (text, sep) = (args.str(0)?, args.str(1)?);
                let parts = if sep.is_empty() {
                    text.chars().map(|c| Value::String(c.to_string())).collect()
                } else {
                    text.split(sep).map(Value::from).collect()
                };
                Ok(Value::Vector(parts))
            })),
        string_test("has-prefix?", "Whether a string starts with a prefix", |s, p| s.starts_with(p)),
        string_test("has-suffix?", "Whether a string ends with a suffix", |s, p| s.ends_with(p)),
        Function::new("trim-prefix", "Removes a prefix from a string if present")
            .form(Form::new(&[Param::String, Param::String], |args| {
                let text = args.str(0)?;
                Ok(Value::from(text.strip_prefix(args.str(1)?).unwrap_or(text)))
            })),
        Function::new("trim-suffix", "Removes a suffix from a string if present")
            .form(Form::new(&[Param::String, Param::String], |args| {
                let text = args.str(0)?;
                Ok(Value::from(text.strip_suffix(args.str(1)?).unwrap_or(text)))
            })),
        string_map("to-lower", "Lowercases a string", str::to_lowercase),
        string_map("to-upper", "Uppercases a string", str::to_uppercase),
        string_map("trim", "Removes leading and trailing whitespace", |s| s.trim().to_string()),
        Function::new("replace", "Replaces every occurrence of a substring")
            .form(Form::new(&[Param::String, Param::String, Param::String], |args| {
                Ok(Value::String(args.str(0)?.replace(args.str(1)?, args.str(2)?)))
            })),
        Function::new("matches?", "Whether a string matches a regular expression")
            .form(Form::new(&[Param::String, Param::String], |args| {
                let re = Regex::new(args.str(1)?)
                    .map_err(|e| EvalError::Argument(format!("invalid regex: {e}")))?;
                Ok(Value::Bool(re.is_match(args.str(0)?)))
            })),
    ]
}

fn string_test(name: &str, description: &str, test: fn(&str, &str) -> bool) -> Function {
    Function::new(name, description).form(Form::new(&[Param::String, Param::String], move |args| {
        Ok(Value::Bool(test(args.str(0)?, args.str(1)?)))
    }))
}

fn string_map(name: &str, description: &str, map: fn(&str) -> String) -> Function {
    Function::new(name, description)
        .form(Form::new(&[Param::String], move |args| Ok(Value::String(map(args.str(0)?)))))
}
