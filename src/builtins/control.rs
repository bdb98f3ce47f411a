//! Special forms: branching, sequencing, error recovery, and the
//! whole-value editors `set`, `patch` and `delete`.

use super::render;
use crate::ast::{Expr, Symbol, VectorNode};
use crate::context::Context;
use crate::evaluator::{
    EvalError, bang_target, eval_expr, eval_sequence, symbol_path, symbol_value, write_symbol,
};
use crate::functions::{Args, Form, Function, Param};
use crate::path;
use crate::value::Value;

pub(super) fn functions() -> Vec<Function> {
    vec![
        if_function(),
        case_function(),
        Function::new("do", "Evaluates each argument in turn and returns the last value")
            .form(Form::variadic(&[Param::Context, Param::Expression], |args| {
                Ok(eval_sequence(args.context(0)?, args.rest_exprs()?)?.1)
            })),
        Function::new("try", "Evaluates the first argument; on error evaluates the second with $error bound")
            .form(Form::new(&[Param::Context, Param::Expression, Param::Expression], |args| {
                recover(args.context(0)?, args.expr(1)?, Some(args.expr(2)?))
            }))
            .form(Form::new(&[Param::Context, Param::Expression], |args| {
                recover(args.context(0)?, args.expr(1)?, None)
            })),
        Function::new("default", "The first argument's value, or the second's when the first fails or is empty")
            .form(Form::new(&[Param::Context, Param::Expression, Param::Expression], |args| {
                let ctx = args.context(0)?;
                match eval_expr(ctx, args.expr(1)?) {
                    Ok((_, value)) if !value.is_empty() => Ok(value),
                    Err(err) if err.is_cancellation() => Err(err),
                    _ => Ok(eval_expr(ctx, args.expr(2)?)?.1),
                }
            })),
        set_function(),
        patch_function(),
        delete_function(),
        Function::new("has?", "Whether a variable or document path exists")
            .form(Form::new(&[Param::Context, Param::Expression], |args| {
                let ctx = args.context(0)?;
                let symbol = target("has?", args.expr(1)?)?;
                has_path(ctx, symbol).map(Value::Bool)
            })),
        Function::new("error", "Fails with a message; each {} is replaced by the next argument")
            .form(Form::new(&[Param::String], |args| {
                Err(EvalError::Custom(args.str(0)?.to_string()))
            }))
            .form(Form::variadic(&[Param::String, Param::Any], |args| {
                Err(EvalError::Custom(interpolate(args.str(0)?, &args.rest_values())))
            })),
        Function::new("func", "Defines a function: (func! name [$param ...] body ...)")
            .form(Form::variadic(&[Param::Expression], |_| {
                Err(EvalError::Argument("functions are defined with `func!`".to_string()))
            }))
            .bang(define_function),
    ]
}

fn if_function() -> Function {
    Function::new("if", "Evaluates the second argument when the condition holds, otherwise the third")
        .form(Form::new(
            &[Param::Context, Param::Bool, Param::Expression, Param::Expression],
            |args| {
                let branch = if args.bool(1)? { args.expr(2)? } else { args.expr(3)? };
                Ok(eval_expr(args.context(0)?, branch)?.1)
            },
        ))
        .form(Form::new(&[Param::Context, Param::Bool, Param::Expression], |args| {
            if args.bool(1)? {
                Ok(eval_expr(args.context(0)?, args.expr(2)?)?.1)
            } else {
                Ok(Value::Null)
            }
        }))
}

/// `(case cond value cond value ... [fallback])`
fn case_function() -> Function {
    Function::new("case", "Returns the value paired with the first true condition, else the fallback")
        .form(Form::variadic(&[Param::Context, Param::Expression], |args| {
            let ctx = args.context(0)?;
            let exprs = args.rest_exprs()?;
            let mut pairs = exprs.chunks_exact(2);
            for pair in &mut pairs {
                let (_, condition) = eval_expr(ctx, pair[0])?;
                if ctx.coalescer().to_bool(&condition)? {
                    return Ok(eval_expr(ctx, pair[1])?.1);
                }
            }
            match pairs.remainder() {
                [fallback] => Ok(eval_expr(ctx, fallback)?.1),
                _ => Ok(Value::Null),
            }
        }))
}

fn recover(ctx: &Context, body: &Expr, fallback: Option<&Expr>) -> Result<Value, EvalError> {
    match eval_expr(ctx, body) {
        Ok((_, value)) => Ok(value),
        Err(err) if err.is_cancellation() => Err(err),
        Err(err) => {
            tracing::debug!(error = %err, "error recovered");
            match fallback {
                Some(fallback) => {
                    let scope = ctx.with_variable("error", Value::String(err.to_string()));
                    Ok(eval_expr(&scope, fallback)?.1)
                }
                None => Ok(Value::Null),
            }
        }
    }
}

fn target<'a>(function: &str, expr: &'a Expr) -> Result<&'a Symbol, EvalError> {
    match expr {
        Expr::Symbol(symbol) => Ok(symbol),
        other => Err(EvalError::Argument(format!(
            "`{function}` needs a variable or document path, got `{other}`"
        ))),
    }
}

fn arity(function: &str, expected: &str, got: usize) -> EvalError {
    EvalError::Argument(format!("`{function}` takes {expected}, got {got} arguments"))
}

fn set_function() -> Function {
    Function::new("set", "Sets the value at a path; returns the whole updated value, `set!` stores it")
        .form(Form::new(&[Param::Context, Param::Expression, Param::Any], |args| {
            let ctx = args.context(0)?;
            let symbol = target("set", args.expr(1)?)?;
            let root = symbol_value(ctx, symbol, true)?;
            let path = symbol_path(ctx, symbol)?;
            Ok(path::set(&root, &path, args.value(2)?.clone())?)
        }))
        .bang(|ctx, args| {
            let [_, value_expr] = args else {
                return Err(arity("set!", "a target and a value", args.len()));
            };
            let symbol = bang_target("set", args)?;
            let (_, value) = eval_expr(ctx, value_expr)?;
            let root = symbol_value(ctx, symbol, true)?;
            let updated = path::set(&root, &symbol_path(ctx, symbol)?, value.clone())?;
            Ok((write_symbol(ctx, symbol, updated), value))
        })
}

/// `(patch TARGET $var EXPR)` evaluates EXPR with `$var` bound to each
/// value at the target path and stores the result there.
fn patch_function() -> Function {
    Function::new("patch", "Replaces the value at a path with EXPR evaluated on it: (patch TARGET $v EXPR)")
        .form(Form::new(
            &[Param::Context, Param::Expression, Param::Expression, Param::Expression],
            |args| {
                let symbol = target("patch", args.expr(1)?)?;
                patched(args.context(0)?, symbol, args.expr(2)?, args.expr(3)?)
            },
        ))
        .bang(|ctx, args| {
            let [_, binding, body] = args else {
                return Err(arity("patch!", "a target, a variable and an expression", args.len()));
            };
            let symbol = bang_target("patch", args)?;
            let updated = patched(ctx, symbol, binding, body)?;
            Ok((write_symbol(ctx, symbol, updated.clone()), updated))
        })
}

fn patched(ctx: &Context, symbol: &Symbol, binding: &Expr, body: &Expr) -> Result<Value, EvalError> {
    let name = variable_name(binding)?;
    let root = symbol_value(ctx, symbol, true)?;
    let path = symbol_path(ctx, symbol)?;
    path::patch(&root, &path, |existing| {
        let scope = ctx.with_variable(name, existing.cloned().unwrap_or(Value::Null));
        Ok(eval_expr(&scope, body)?.1)
    })
}

fn delete_function() -> Function {
    Function::new("delete", "Removes the value at a path; returns the whole updated value, `delete!` stores it")
        .form(Form::new(&[Param::Context, Param::Expression], |args| {
            let ctx = args.context(0)?;
            let symbol = target("delete", args.expr(1)?)?;
            let root = symbol_value(ctx, symbol, false)?;
            Ok(path::delete(&root, &symbol_path(ctx, symbol)?)?)
        }))
        .bang(|ctx, args| {
            if args.len() != 1 {
                return Err(arity("delete!", "a target", args.len()));
            }
            let symbol = bang_target("delete", args)?;
            let root = symbol_value(ctx, symbol, false)?;
            let updated = path::delete(&root, &symbol_path(ctx, symbol)?)?;
            Ok((write_symbol(ctx, symbol, updated.clone()), updated))
        })
}

fn has_path(ctx: &Context, symbol: &Symbol) -> Result<bool, EvalError> {
    let root = match symbol_value(ctx, symbol, false) {
        Ok(root) => root,
        Err(EvalError::UnknownVariable(_)) => return Ok(false),
        Err(err) => return Err(err),
    };
    let path = symbol_path(ctx, symbol)?;
    match path::get(&root, &path) {
        Ok(Value::Vector(matches)) if path.has_filters() => Ok(!matches.is_empty()),
        Ok(_) => Ok(true),
        Err(EvalError::Path(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Name of a bare `$variable` used as a binding.
pub(super) fn variable_name(expr: &Expr) -> Result<&str, EvalError> {
    match expr {
        Expr::Symbol(Symbol { variable: Some(name), path: None }) => Ok(name.as_str()),
        other => Err(EvalError::Argument(format!("expected a plain variable, got `{other}`"))),
    }
}

fn interpolate(template: &str, values: &[Value]) -> String {
    let mut out = String::new();
    let mut values = values.iter();
    let mut rest = template;
    while let Some(at) = rest.find("{}") {
        out.push_str(&rest[..at]);
        match values.next() {
            Some(value) => out.push_str(&render(value)),
            None => out.push_str("{}"),
        }
        rest = &rest[at + 2..];
    }
    out.push_str(rest);
    out
}

/// `(func! name [$a $b] body ...)`
fn define_function(ctx: &Context, args: &[Expr]) -> Result<(Context, Value), EvalError> {
    let [name, params, body @ ..] = args else {
        return Err(arity("func!", "a name, a parameter vector and a body", args.len()));
    };
    let Expr::Identifier(ident) = name else {
        return Err(EvalError::Argument(format!("`func!` needs a function name, got `{name}`")));
    };
    let Expr::Vector(VectorNode { expressions, path: None }) = params else {
        return Err(EvalError::Argument(format!(
            "`func!` needs a parameter vector like [$a $b], got `{params}`"
        )));
    };
    if body.is_empty() {
        return Err(EvalError::Argument(format!("`{}` has an empty body", ident.name)));
    }

    let names = expressions
        .iter()
        .map(|expr| variable_name(expr).map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;
    let mut form_params = vec![Param::Context];
    form_params.extend(std::iter::repeat_n(Param::Any, names.len()));

    let usage = names.iter().map(|n| format!(" ${n}")).collect::<String>();
    let description = format!("User-defined: ({}{usage})", ident.name);
    let body = body.to_vec();
    let function = Function::new(ident.name.clone(), description).form(Form::new(
        &form_params,
        move |args: Args<'_>| call_user_function(&args, &names, &body),
    ));

    tracing::debug!(function = %ident.name, params = expressions.len(), "function defined");
    Ok((ctx.with_function(function), Value::Null))
}

/// Runs a user function body in the caller's context with the parameters
/// bound. Nothing the body binds survives the call.
fn call_user_function(args: &Args<'_>, names: &[String], body: &[Expr]) -> Result<Value, EvalError> {
    let mut scope = args.context(0)?.clone();
    for (i, name) in names.iter().enumerate() {
        scope = scope.with_variable(name.clone(), args.value(i + 1)?.clone());
    }
    Ok(eval_sequence(&scope, body)?.1)
}
