use thiserror::Error;

use crate::{
    ast::{Expr, ObjectNode, PathExpr, PathStep, Program, Symbol, Tuple, VectorNode},
    coalescing::CoercionError,
    context::{Context, Document},
    functions::Function,
    path::{self, Key, Path, PathError, Predicate, Step},
    value::{Map, Value},
};

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Reference to a variable that is not bound
    #[error("unknown variable `${0}`")]
    UnknownVariable(String),

    /// Call to a function that is not registered or defined
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    /// None of the function's forms accepted the arguments
    #[error("{}", no_match_message(.function, .argument))]
    NoMatchingForm {
        function: String,
        /// The argument that failed, when the function has a single form.
        argument: Option<usize>,
    },

    /// Call whose head is not a function name
    #[error("`{0}` is not a function name")]
    NotCallable(String),

    /// Expression that has no value on its own, such as a bare identifier
    #[error("{0} cannot be evaluated on its own")]
    NotEvaluable(String),

    /// Path step that evaluated to neither an index nor a key
    #[error("invalid path step: {0}")]
    InvalidStep(String),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Path(#[from] PathError),

    /// The run's cancellation token fired
    #[error("evaluation cancelled")]
    Cancelled,

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow")]
    Overflow,

    /// Raised by the `error` function
    #[error("{0}")]
    Custom(String),

    #[error("type error: {0}")]
    TypeError(String),

    /// Malformed arguments to a special form
    #[error("{0}")]
    Argument(String),
}

impl EvalError {
    /// Cancellation must pass through `try` and `default` untouched.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, EvalError::Cancelled)
    }
}

fn no_match_message(function: &str, argument: &Option<usize>) -> String {
    match argument {
        Some(index) => format!("`{function}`: argument {index} does not match any form"),
        None => format!("`{function}`: none of the available forms matched"),
    }
}

/// Evaluates every statement in order, threading the context forward.
///
/// Returns the context after the last statement together with its value;
/// an empty program yields `null`.
pub fn eval_program(ctx: &Context, program: &Program) -> Result<(Context, Value), EvalError> {
    eval_sequence(ctx, program.statements.iter().map(|s| &s.expression))
}

/// Evaluates expressions one after another; each sees the context the
/// previous one left behind.
pub(crate) fn eval_sequence<'a>(
    ctx: &Context,
    exprs: impl IntoIterator<Item = &'a Expr>,
) -> Result<(Context, Value), EvalError> {
    let mut ctx = ctx.clone();
    let mut result = Value::Null;
    for expr in exprs {
        let (next, value) = eval_expr(&ctx, expr)?;
        ctx = next;
        result = value;
    }
    Ok((ctx, result))
}

/// Evaluates one expression.
///
/// The returned context differs from `ctx` only after a bang call that
/// rebinds a variable or defines a function.
pub fn eval_expr(ctx: &Context, expr: &Expr) -> Result<(Context, Value), EvalError> {
    match expr {
        Expr::Null => Ok((ctx.clone(), Value::Null)),
        Expr::Bool(b) => Ok((ctx.clone(), Value::Bool(*b))),
        Expr::Integer(n) => Ok((ctx.clone(), Value::Int(*n))),
        Expr::Float(n) => Ok((ctx.clone(), Value::Float(*n))),
        Expr::String(s) => Ok((ctx.clone(), Value::String(s.clone()))),
        Expr::Shim(value) => Ok((ctx.clone(), value.clone())),
        Expr::Identifier(ident) => Err(EvalError::NotEvaluable(format!("identifier `{ident}`"))),
        Expr::Symbol(symbol) => Ok((ctx.clone(), eval_symbol(ctx, symbol)?)),
        Expr::Vector(node) => Ok((ctx.clone(), eval_vector(ctx, node)?)),
        Expr::Object(node) => Ok((ctx.clone(), eval_object(ctx, node)?)),
        Expr::Tuple(tuple) => eval_tuple(ctx, tuple),
    }
}

fn eval_symbol(ctx: &Context, symbol: &Symbol) -> Result<Value, EvalError> {
    let Some(path_expr) = &symbol.path else {
        return symbol_value(ctx, symbol, false);
    };
    let path = resolve_path(ctx, path_expr)?;
    match &symbol.variable {
        Some(_) => Ok(path::get(&symbol_value(ctx, symbol, false)?, &path)?),
        // Without filters nothing runs during the read, so the document can
        // be read in place.
        None if !path.has_filters() => Ok(path::get(&ctx.document().borrow(), &path)?),
        None => Ok(path::get(&ctx.document().snapshot(), &path)?),
    }
}

fn eval_vector(ctx: &Context, node: &VectorNode) -> Result<Value, EvalError> {
    let mut inner = ctx.clone();
    let mut items = Vec::with_capacity(node.expressions.len());
    for expr in &node.expressions {
        let (next, value) = eval_expr(&inner, expr)?;
        inner = next;
        items.push(value);
    }
    read_path(ctx, Value::Vector(items), node.path.as_ref())
}

fn eval_object(ctx: &Context, node: &ObjectNode) -> Result<Value, EvalError> {
    let mut inner = ctx.clone();
    let mut map = Map::new();
    for (key_expr, value_expr) in &node.pairs {
        let (next, key) = eval_expr(&inner, key_expr)?;
        let key = next.coalescer().to_string(&key)?;
        let (next, value) = eval_expr(&next, value_expr)?;
        inner = next;
        map.insert(key, value);
    }
    read_path(ctx, Value::Object(map), node.path.as_ref())
}

/// Reads `path` out of a freshly built value, resolving steps in `ctx`.
fn read_path(ctx: &Context, value: Value, path: Option<&PathExpr>) -> Result<Value, EvalError> {
    match path {
        None => Ok(value),
        Some(path_expr) => {
            let path = resolve_path(ctx, path_expr)?;
            Ok(path::get(&value, &path)?)
        }
    }
}

fn eval_tuple(ctx: &Context, tuple: &Tuple) -> Result<(Context, Value), EvalError> {
    ctx.check_cancelled()?;

    let ident = match tuple.head() {
        Some(ident) => ident,
        None => {
            let head = tuple.expressions.first().map(ToString::to_string).unwrap_or_default();
            return Err(EvalError::NotCallable(head));
        }
    };
    let function = ctx
        .functions()
        .get(&ident.name)
        .ok_or_else(|| EvalError::UnknownFunction(ident.name.clone()))?;

    if ident.bang {
        eval_bang(ctx, &function, tuple.args())
    } else {
        call(ctx, &function, tuple.args())
    }
}

#[tracing::instrument(level = "trace", skip_all, fields(function = %function.name()))]
fn call(ctx: &Context, function: &Function, args: &[Expr]) -> Result<(Context, Value), EvalError> {
    let value = function.evaluate(ctx, args)?;
    Ok((ctx.clone(), value))
}

/// Runs a call written with a trailing `!`.
///
/// Functions with their own bang handler take over completely. For the
/// rest, the first argument must be a symbol: the function is applied to
/// the value at the symbol's path (once per match when the path filters),
/// and the result is written back into the variable or the document.
///
/// Without filters the target is re-read after the call, so document
/// writes made by the arguments survive. Through a filter the matches are
/// patched on the value read before the call, and that patched value
/// replaces whatever the arguments wrote to the same target.
#[tracing::instrument(level = "trace", skip_all, fields(function = %function.name()))]
fn eval_bang(
    ctx: &Context,
    function: &Function,
    args: &[Expr],
) -> Result<(Context, Value), EvalError> {
    if let Some(handler) = function.bang_handler() {
        return handler(ctx, args);
    }

    let symbol = bang_target(function.name(), args)?;
    let current = symbol_value(ctx, symbol, false)?;
    let path = symbol_path(ctx, symbol)?;
    let rest = &args[1..];
    tracing::debug!(function = function.name(), target = %symbol, "bang call");

    let apply = |existing: Option<&Value>| {
        let mut call_args = Vec::with_capacity(args.len());
        call_args.push(Expr::Shim(existing.cloned().unwrap_or(Value::Null)));
        call_args.extend_from_slice(rest);
        function.evaluate(ctx, &call_args)
    };

    if path.has_filters() {
        let patched = path::patch(&current, &path, apply)?;
        let ctx = write_symbol(ctx, symbol, patched.clone());
        return Ok((ctx, patched));
    }

    // a dry patch reads the leaf with the same vivification rules as the write
    let mut leaf = None;
    path::patch(&current, &path, |existing| {
        leaf = existing.cloned();
        Ok(Value::Null)
    })?;
    let result = apply(leaf.as_ref())?;

    let fresh = symbol_value(ctx, symbol, false)?;
    let patched = path::set(&fresh, &path, result.clone())?;
    let ctx = write_symbol(ctx, symbol, patched);
    Ok((ctx, result))
}

/// The symbol a bang call writes through.
pub(crate) fn bang_target<'a>(function: &str, args: &'a [Expr]) -> Result<&'a Symbol, EvalError> {
    match args.first() {
        Some(Expr::Symbol(symbol)) => Ok(symbol),
        _ => Err(EvalError::Argument(format!(
            "`{function}!` needs a variable or document path as its first argument"
        ))),
    }
}

/// The whole value a symbol starts from: its variable or the document.
/// With `allow_missing`, an unbound variable reads as null.
pub(crate) fn symbol_value(
    ctx: &Context,
    symbol: &Symbol,
    allow_missing: bool,
) -> Result<Value, EvalError> {
    match &symbol.variable {
        Some(name) => match ctx.variable(name) {
            Some(value) => Ok(value.clone()),
            None if allow_missing => Ok(Value::Null),
            None => Err(EvalError::UnknownVariable(name.clone())),
        },
        None => Ok(ctx.document().snapshot()),
    }
}

/// Stores a new whole value for a symbol. Variables are rebound in the
/// returned context; the document is replaced for every context of the run.
pub(crate) fn write_symbol(ctx: &Context, symbol: &Symbol, value: Value) -> Context {
    match &symbol.variable {
        Some(name) => {
            tracing::debug!(variable = name.as_str(), "variable written");
            ctx.with_variable(name.clone(), value)
        }
        None => {
            ctx.document().replace(value);
            ctx.clone()
        }
    }
}

/// Evaluates the steps of a path expression. Filter steps stay lazy and
/// run when the path engine visits each candidate.
pub(crate) fn resolve_path<'a>(
    ctx: &'a Context,
    path: &'a PathExpr,
) -> Result<Path<ExprFilter<'a>>, EvalError> {
    path.steps
        .iter()
        .map(|step| match step {
            PathStep::Expr(expr) => {
                let (_, value) = eval_expr(ctx, expr)?;
                match value {
                    Value::Int(index) => Ok(Step::Index(index)),
                    Value::String(key) => Ok(Step::Key(key)),
                    other => Err(EvalError::InvalidStep(format!(
                        "expected an int index or string key, got {}",
                        other.type_name()
                    ))),
                }
            }
            PathStep::Filter(expr) => Ok(Step::Filter(ExprFilter { ctx, expr })),
        })
        .collect()
}

/// Resolves a symbol's path, or the empty path when it has none.
pub(crate) fn symbol_path<'a>(
    ctx: &'a Context,
    symbol: &'a Symbol,
) -> Result<Path<ExprFilter<'a>>, EvalError> {
    match &symbol.path {
        Some(path_expr) => resolve_path(ctx, path_expr),
        None => Ok(Path::default()),
    }
}

/// A filter step backed by a script expression.
///
/// The predicate runs with `.` bound to the candidate element; variables
/// and functions are those of the context the path was resolved in.
pub struct ExprFilter<'a> {
    ctx: &'a Context,
    expr: &'a Expr,
}

impl Predicate for ExprFilter<'_> {
    type Error = EvalError;

    fn keep(&self, _key: &Key, value: &Value) -> Result<bool, EvalError> {
        let scope = self.ctx.with_document(Document::new(value.clone()));
        match eval_expr(&scope, self.expr) {
            Ok((_, result)) => Ok(self.ctx.coalescer().to_bool(&result)?),
            // A candidate missing the fields the predicate reads is not a match
            Err(EvalError::Path(err)) if err.is_soft() => Ok(false),
            Err(err) => Err(err),
        }
    }
}
