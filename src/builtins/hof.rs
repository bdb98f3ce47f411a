use std::sync::Arc;

use super::control::variable_name;
use crate::ast::{Expr, VectorNode};
use crate::context::Context;
use crate::evaluator::{EvalError, eval_expr};
use crate::functions::{Form, Function, Param};
use crate::value::{Map, Value};

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new(
            "map",
            "Applies a function to every item: (map SRC fn), (map SRC $v EXPR) or (map SRC [$k $v] EXPR)",
        )
        .form(Form::new(&[Param::Context, Param::Any, Param::Expression], |args| {
            let ctx = args.context(0)?;
            map_items(ctx, args.value(1)?, &Mapper::named(ctx, args.expr(2)?)?)
        }))
        .form(Form::new(
            &[Param::Context, Param::Any, Param::Expression, Param::Expression],
            |args| {
                let mapper = Mapper::bound(args.expr(2)?, args.expr(3)?)?;
                map_items(args.context(0)?, args.value(1)?, &mapper)
            },
        )),
        Function::new(
            "filter",
            "Keeps the items a predicate accepts: (filter SRC fn), (filter SRC $v EXPR) or (filter SRC [$k $v] EXPR)",
        )
        .form(Form::new(&[Param::Context, Param::Any, Param::Expression], |args| {
            let ctx = args.context(0)?;
            filter_items(ctx, args.value(1)?, &Mapper::named(ctx, args.expr(2)?)?)
        }))
        .form(Form::new(
            &[Param::Context, Param::Any, Param::Expression, Param::Expression],
            |args| {
                let mapper = Mapper::bound(args.expr(2)?, args.expr(3)?)?;
                filter_items(args.context(0)?, args.value(1)?, &mapper)
            },
        )),
        Function::new("range", "Integers from START (default 0) up to, not including, END by STEP")
            .form(Form::new(&[Param::Int], |args| range(0, args.int(0)?, 1)))
            .form(Form::new(&[Param::Int, Param::Int], |args| range(args.int(0)?, args.int(1)?, 1)))
            .form(Form::new(&[Param::Int, Param::Int, Param::Int], |args| {
                range(args.int(0)?, args.int(1)?, args.int(2)?)
            })),
    ]
}

/// What `map` and `filter` run on each item.
enum Mapper<'a> {
    /// A function called with the item as its only argument.
    Named(Arc<Function>),
    /// An expression evaluated with the item (and optionally its key or
    /// index) bound to variables.
    Bound {
        key: Option<&'a str>,
        value: &'a str,
        body: &'a Expr,
    },
}

impl<'a> Mapper<'a> {
    fn named(ctx: &Context, expr: &Expr) -> Result<Self, EvalError> {
        let Expr::Identifier(ident) = expr else {
            return Err(EvalError::Argument(format!("expected a function name, got `{expr}`")));
        };
        ctx.functions()
            .get(&ident.name)
            .map(Mapper::Named)
            .ok_or_else(|| EvalError::UnknownFunction(ident.name.clone()))
    }

    fn bound(binding: &'a Expr, body: &'a Expr) -> Result<Self, EvalError> {
        match binding {
            Expr::Vector(VectorNode { expressions, path: None }) => match expressions.as_slice() {
                [key, value] => Ok(Mapper::Bound {
                    key: Some(variable_name(key)?),
                    value: variable_name(value)?,
                    body,
                }),
                _ => Err(EvalError::Argument(format!(
                    "expected [$key $value], got `{binding}`"
                ))),
            },
            other => Ok(Mapper::Bound { key: None, value: variable_name(other)?, body }),
        }
    }

    fn apply(&self, ctx: &Context, key: Value, item: &Value) -> Result<Value, EvalError> {
        match self {
            Mapper::Named(function) => function.evaluate(ctx, &[Expr::Shim(item.clone())]),
            Mapper::Bound { key: key_name, value, body } => {
                let mut scope = ctx.with_variable(*value, item.clone());
                if let Some(name) = key_name {
                    scope = scope.with_variable(*name, key);
                }
                Ok(eval_expr(&scope, body)?.1)
            }
        }
    }
}

fn not_iterable(function: &str, value: &Value) -> EvalError {
    EvalError::TypeError(format!("`{function}` needs a vector or object, got {}", value.type_name()))
}

/// Objects keep their keys; null maps to an empty vector.
fn map_items(ctx: &Context, source: &Value, mapper: &Mapper<'_>) -> Result<Value, EvalError> {
    match source {
        Value::Null => Ok(Value::Vector(Vec::new())),
        Value::Vector(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| mapper.apply(ctx, Value::Int(i as i64), item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Vector),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), mapper.apply(ctx, Value::String(k.clone()), v)?)))
            .collect::<Result<Map, EvalError>>()
            .map(Value::Object),
        other => Err(not_iterable("map", other)),
    }
}

fn filter_items(ctx: &Context, source: &Value, mapper: &Mapper<'_>) -> Result<Value, EvalError> {
    let keep = |key: Value, item: &Value| -> Result<bool, EvalError> {
        let verdict = mapper.apply(ctx, key, item)?;
        Ok(ctx.coalescer().to_bool(&verdict)?)
    };
    match source {
        Value::Null => Ok(Value::Vector(Vec::new())),
        Value::Vector(items) => {
            let mut kept = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if keep(Value::Int(i as i64), item)? {
                    kept.push(item.clone());
                }
            }
            Ok(Value::Vector(kept))
        }
        Value::Object(map) => {
            let mut kept = Map::new();
            for (k, v) in map {
                if keep(Value::String(k.clone()), v)? {
                    kept.insert(k.clone(), v.clone());
                }
            }
            Ok(Value::Object(kept))
        }
        other => Err(not_iterable("filter", other)),
    }
}

fn range(start: i64, end: i64, step: i64) -> Result<Value, EvalError> {
    if step == 0 {
        return Err(EvalError::Argument("`range` step cannot be zero".to_string()));
    }
    let mut out = Vec::new();
    let mut n = start;
    while (step > 0 && n < end) || (step < 0 && n > end) {
        out.push(Value::Int(n));
        match n.checked_add(step) {
            Some(next) => n = next,
            None => break,
        }
    }
    Ok(Value::Vector(out))
}
