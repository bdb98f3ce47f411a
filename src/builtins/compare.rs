use std::cmp::Ordering;

use super::aliased;
use crate::evaluator::EvalError;
use crate::functions::{Form, Function, Param};
use crate::value::{Number, Value};

pub(super) fn functions() -> Vec<Function> {
    let eq = Function::new("eq", "Whether two values are equal; 1 and 1.0 are equal")
        .form(Form::new(&[Param::Any, Param::Any], |args| {
            Ok(Value::Bool(args.value(0)?.loose_eq(args.value(1)?)))
        }));

    let mut out = aliased(eq, &["=="]);
    out.extend(aliased(ordering("lt", "Whether the first value is less than the second", Ordering::is_lt), &["<"]));
    out.extend(aliased(ordering("lte", "Whether the first value is at most the second", Ordering::is_le), &["<="]));
    out.extend(aliased(ordering("gt", "Whether the first value is greater than the second", Ordering::is_gt), &[">"]));
    out.extend(aliased(ordering("gte", "Whether the first value is at least the second", Ordering::is_ge), &[">="]));
    out
}

/// Numbers compare numerically, strings lexicographically.
fn ordering(name: &str, description: &str, test: fn(Ordering) -> bool) -> Function {
    Function::new(name, description)
        .form(Form::new(&[Param::Number, Param::Number], move |args| {
            let ordering = compare_numbers(args.number(0)?, args.number(1)?)?;
            Ok(Value::Bool(test(ordering)))
        }))
        .form(Form::new(&[Param::String, Param::String], move |args| {
            Ok(Value::Bool(test(args.str(0)?.cmp(args.str(1)?))))
        }))
}

fn compare_numbers(a: Number, b: Number) -> Result<Ordering, EvalError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Ok(x.cmp(&y)),
        _ => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .ok_or_else(|| EvalError::TypeError("cannot compare NaN".to_string())),
    }
}
