use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::evaluator::EvalError;
use crate::functions::{Form, Function, Param};
use crate::value::Value;

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new("now", "The current UTC time as RFC 3339, or formatted with a strftime pattern")
            .form(Form::new(&[], |_| Ok(Value::String(Utc::now().to_rfc3339()))))
            .form(Form::new(&[Param::String], |args| {
                format_time(&Utc::now(), args.str(0)?).map(Value::String)
            })),
    ]
}

/// Formats without panicking on a bad pattern.
fn format_time(time: &DateTime<Utc>, pattern: &str) -> Result<String, EvalError> {
    let mut out = String::new();
    write!(out, "{}", time.format(pattern))
        .map_err(|_| EvalError::Argument(format!("invalid time format `{pattern}`")))?;
    Ok(out)
}
