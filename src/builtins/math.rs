use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use super::aliased;
use crate::evaluator::EvalError;
use crate::functions::{Form, Function, Param};
use crate::value::{Number, Value};

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

pub(super) fn functions() -> Vec<Function> {
    let mut out = Vec::new();
    out.extend(aliased(arithmetic("+", "Adds two or more numbers", Op::Add), &["add"]));
    out.extend(aliased(arithmetic("-", "Subtracts the remaining numbers from the first", Op::Sub), &["sub"]));
    out.extend(aliased(arithmetic("*", "Multiplies two or more numbers", Op::Mul), &["mult"]));
    out.extend(aliased(arithmetic("/", "Divides the first number by the remaining ones", Op::Div), &["div"]));
    out.push(
        Function::new("mod", "Remainder of dividing the first number by the second")
            .form(Form::new(&[Param::Int, Param::Int], |args| {
                let (a, b) = (args.int(0)?, args.int(1)?);
                if b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                a.checked_rem(b).map(Value::Int).ok_or(EvalError::Overflow)
            }))
            .form(Form::new(&[Param::Float, Param::Float], |args| {
                let (a, b) = (args.float(0)?, args.float(1)?);
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Float(a % b))
            })),
    );
    out
}

/// An operator over two or more arguments. Integer-only calls stay in
/// integer arithmetic; anything involving a float goes through
/// [`combine`].
fn arithmetic(name: &str, description: &str, op: Op) -> Function {
    Function::new(name, description)
        .form(Form::variadic(&[Param::Int, Param::Int], move |args| {
            fold(op, Number::Int(args.int(0)?), args.rest_ints()?.into_iter().map(Number::Int))
        }))
        .form(Form::variadic(&[Param::Number, Param::Number], move |args| {
            fold(op, args.number(0)?, args.rest_numbers()?)
        }))
}

fn fold(op: Op, first: Number, rest: impl IntoIterator<Item = Number>) -> Result<Value, EvalError> {
    let mut acc = first;
    for n in rest {
        acc = combine(op, acc, n)?;
    }
    Ok(Value::from(acc))
}

fn combine(op: Op, a: Number, b: Number) -> Result<Number, EvalError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_combine(op, x, y),
        (Number::Float(x), Number::Float(y)) => float_combine(op, x, y),
        _ => decimal_combine(op, a, b),
    }
}

fn int_combine(op: Op, a: i64, b: i64) -> Result<Number, EvalError> {
    let result = match op {
        Op::Add => a.checked_add(b),
        Op::Sub => a.checked_sub(b),
        Op::Mul => a.checked_mul(b),
        Op::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            // Uneven division leaves the integers
            if a.checked_rem(b).is_some_and(|r| r != 0) {
                return decimal_combine(op, Number::Int(a), Number::Int(b));
            }
            a.checked_div(b)
        }
    };
    result.map(Number::Int).ok_or(EvalError::Overflow)
}

fn float_combine(op: Op, a: f64, b: f64) -> Result<Number, EvalError> {
    let result = match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
        Op::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
    };
    Ok(Number::Float(result))
}

fn to_decimal(n: Number) -> Option<Decimal> {
    match n {
        Number::Int(n) => Decimal::from_i64(n),
        Number::Float(n) => Decimal::from_f64(n),
    }
}

/// Mixed int/float arithmetic in decimal, so `0.1 + 2` is `2.1` and
/// `1.5 * 2` is the integer `3`. Falls back to floats when a value does
/// not fit a decimal.
fn decimal_combine(op: Op, a: Number, b: Number) -> Result<Number, EvalError> {
    if let Some(ad) = to_decimal(a)
        && let Some(bd) = to_decimal(b)
    {
        let result = match op {
            Op::Add => ad.checked_add(bd),
            Op::Sub => ad.checked_sub(bd),
            Op::Mul => ad.checked_mul(bd),
            Op::Div => {
                if bd.is_zero() {
                    return Err(EvalError::DivisionByZero);
                }
                ad.checked_div(bd)
            }
        };
        if let Some(rd) = result {
            if rd.is_integer()
                && let Some(r) = rd.to_i64()
            {
                return Ok(Number::Int(r));
            } else if let Some(r) = rd.to_f64() {
                return Ok(Number::Float(r));
            }
        }
    }
    float_combine(op, a.as_f64(), b.as_f64())
}
