use crate::evaluator::{EvalError, eval_expr};
use crate::functions::{Args, Form, Function, Param};
use crate::value::Value;

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new("and", "True when every argument is true; stops at the first false one")
            .form(Form::variadic(&[Param::Context, Param::Expression], |args| {
                short_circuit(&args, false)
            })),
        Function::new("or", "True when any argument is true; stops at the first true one")
            .form(Form::variadic(&[Param::Context, Param::Expression], |args| {
                short_circuit(&args, true)
            })),
        Function::new("not", "Negates a boolean")
            .form(Form::new(&[Param::Bool], |args| Ok(Value::Bool(!args.bool(0)?)))),
    ]
}

/// Evaluates arguments until one equals `stop_on`.
fn short_circuit(args: &Args<'_>, stop_on: bool) -> Result<Value, EvalError> {
    let ctx = args.context(0)?;
    for expr in args.rest_exprs()? {
        let (_, value) = eval_expr(ctx, expr)?;
        if ctx.coalescer().to_bool(&value)? == stop_on {
            return Ok(Value::Bool(stop_on));
        }
    }
    Ok(Value::Bool(!stop_on))
}
