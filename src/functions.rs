//! Multi-form functions and argument dispatch.
//!
//! A [`Function`] is an ordered list of [`Form`]s. Each form declares the
//! kinds of parameters it takes; a call tries the forms in declaration order
//! and runs the first one whose parameters accept every argument. More
//! specific forms should therefore be declared before more general ones.
//!
//! ```
//! use quill_lang::functions::{Form, Function, Param};
//! use quill_lang::Value;
//!
//! let twice = Function::new("twice", "Doubles a number or repeats a string")
//!     .form(Form::new(&[Param::Int], |args| Ok(Value::Int(args.int(0)? * 2))))
//!     .form(Form::new(&[Param::String], |args| Ok(Value::String(args.str(0)?.repeat(2)))));
//! assert_eq!(twice.forms().len(), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::ast::Expr;
use crate::context::Context;
use crate::evaluator::{EvalError, eval_expr};
use crate::value::{Map, Number, Value};

/// The kind of value a form parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Bool,
    Int,
    Float,
    /// Int or float, whichever the coalescer produces.
    Number,
    String,
    Vector,
    Object,
    /// Any evaluated value, unconverted.
    Any,
    /// The argument expression itself, unevaluated.
    Expression,
    /// The calling context. Consumes no argument.
    Context,
}

impl Param {
    fn consumes_argument(self) -> bool {
        self != Param::Context
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Param::Bool => "bool",
            Param::Int => "int",
            Param::Float => "float",
            Param::Number => "number",
            Param::String => "string",
            Param::Vector => "vector",
            Param::Object => "object",
            Param::Any => "any",
            Param::Expression => "expr",
            Param::Context => "ctx",
        };
        f.write_str(name)
    }
}

/// A bound argument, converted to the kind its parameter asked for.
#[derive(Debug, Clone)]
pub enum Arg<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Number(Number),
    String(String),
    Vector(Vec<Value>),
    Object(Map),
    Any(Value),
    Expression(&'a Expr),
    Context(&'a Context),
}

impl<'a> Arg<'a> {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Bool(_) => "bool",
            Arg::Int(_) => "int",
            Arg::Float(_) => "float",
            Arg::Number(_) => "number",
            Arg::String(_) => "string",
            Arg::Vector(_) => "vector",
            Arg::Object(_) => "object",
            Arg::Any(_) => "value",
            Arg::Expression(_) => "expression",
            Arg::Context(_) => "context",
        }
    }

    /// The argument as a plain value. Expressions and contexts have none.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Arg::Bool(b) => Some(Value::Bool(*b)),
            Arg::Int(n) => Some(Value::Int(*n)),
            Arg::Float(n) => Some(Value::Float(*n)),
            Arg::Number(n) => Some(Value::from(*n)),
            Arg::String(s) => Some(Value::String(s.clone())),
            Arg::Vector(items) => Some(Value::Vector(items.clone())),
            Arg::Object(map) => Some(Value::Object(map.clone())),
            Arg::Any(value) => Some(value.clone()),
            Arg::Expression(_) | Arg::Context(_) => None,
        }
    }
}

fn wrong_kind(index: usize, expected: &str, found: &Arg<'_>) -> EvalError {
    EvalError::Argument(format!(
        "argument {index}: expected {expected}, got {}",
        found.kind()
    ))
}

/// Arguments of a matched form, in parameter order.
///
/// Fixed parameters are read by index; arguments swallowed by a trailing
/// variadic parameter are in [`Args::rest`].
#[derive(Debug)]
pub struct Args<'a> {
    fixed: Vec<Arg<'a>>,
    rest: Vec<Arg<'a>>,
}

impl<'a> Args<'a> {
    fn get(&self, index: usize) -> Result<&Arg<'a>, EvalError> {
        self.fixed
            .get(index)
            .ok_or_else(|| EvalError::Argument(format!("missing argument {index}")))
    }

    pub fn len(&self) -> usize {
        self.fixed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty()
    }

    pub fn bool(&self, index: usize) -> Result<bool, EvalError> {
        match self.get(index)? {
            Arg::Bool(b) => Ok(*b),
            other => Err(wrong_kind(index, "bool", other)),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64, EvalError> {
        match self.get(index)? {
            Arg::Int(n) => Ok(*n),
            other => Err(wrong_kind(index, "int", other)),
        }
    }

    pub fn float(&self, index: usize) -> Result<f64, EvalError> {
        match self.get(index)? {
            Arg::Float(n) => Ok(*n),
            other => Err(wrong_kind(index, "float", other)),
        }
    }

    pub fn number(&self, index: usize) -> Result<Number, EvalError> {
        match self.get(index)? {
            Arg::Number(n) => Ok(*n),
            other => Err(wrong_kind(index, "number", other)),
        }
    }

    pub fn str(&self, index: usize) -> Result<&str, EvalError> {
        match self.get(index)? {
            Arg::String(s) => Ok(s.as_str()),
            other => Err(wrong_kind(index, "string", other)),
        }
    }

    pub fn vector(&self, index: usize) -> Result<&[Value], EvalError> {
        match self.get(index)? {
            Arg::Vector(items) => Ok(items.as_slice()),
            other => Err(wrong_kind(index, "vector", other)),
        }
    }

    pub fn object(&self, index: usize) -> Result<&Map, EvalError> {
        match self.get(index)? {
            Arg::Object(map) => Ok(map),
            other => Err(wrong_kind(index, "object", other)),
        }
    }

    pub fn value(&self, index: usize) -> Result<&Value, EvalError> {
        match self.get(index)? {
            Arg::Any(value) => Ok(value),
            other => Err(wrong_kind(index, "value", other)),
        }
    }

    pub fn expr(&self, index: usize) -> Result<&'a Expr, EvalError> {
        match self.get(index)? {
            Arg::Expression(expr) => Ok(*expr),
            other => Err(wrong_kind(index, "expression", other)),
        }
    }

    pub fn context(&self, index: usize) -> Result<&'a Context, EvalError> {
        match self.get(index)? {
            Arg::Context(ctx) => Ok(*ctx),
            other => Err(wrong_kind(index, "context", other)),
        }
    }

    /// Arguments collected by a variadic parameter.
    pub fn rest(&self) -> &[Arg<'a>] {
        &self.rest
    }

    pub fn rest_numbers(&self) -> Result<Vec<Number>, EvalError> {
        self.rest
            .iter()
            .enumerate()
            .map(|(i, arg)| match arg {
                Arg::Number(n) => Ok(*n),
                other => Err(wrong_kind(self.fixed.len() + i, "number", other)),
            })
            .collect()
    }

    pub fn rest_ints(&self) -> Result<Vec<i64>, EvalError> {
        self.rest
            .iter()
            .enumerate()
            .map(|(i, arg)| match arg {
                Arg::Int(n) => Ok(*n),
                other => Err(wrong_kind(self.fixed.len() + i, "int", other)),
            })
            .collect()
    }

    pub fn rest_exprs(&self) -> Result<Vec<&'a Expr>, EvalError> {
        self.rest
            .iter()
            .enumerate()
            .map(|(i, arg)| match arg {
                Arg::Expression(expr) => Ok(*expr),
                other => Err(wrong_kind(self.fixed.len() + i, "expression", other)),
            })
            .collect()
    }

    /// Variadic arguments as plain values.
    pub fn rest_values(&self) -> Vec<Value> {
        self.rest.iter().filter_map(Arg::to_value).collect()
    }
}

pub type Call = Arc<dyn for<'a> Fn(Args<'a>) -> Result<Value, EvalError> + Send + Sync>;

/// Replaces the generic bang protocol for a function. Receives the calling
/// context and the unevaluated arguments; returns the context to continue
/// with and the call's value.
pub type BangHandler =
    Arc<dyn Fn(&Context, &[Expr]) -> Result<(Context, Value), EvalError> + Send + Sync>;

/// Parameter list of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
    /// The last parameter repeats and needs at least one argument.
    pub variadic: bool,
}

impl Signature {
    /// Minimum and maximum argument counts; `None` means unbounded.
    pub fn arity(&self) -> (usize, Option<usize>) {
        let min = self.params.iter().filter(|p| p.consumes_argument()).count();
        if self.variadic { (min, None) } else { (min, Some(min)) }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: Vec<String> = self
            .params
            .iter()
            .filter(|p| p.consumes_argument())
            .map(ToString::to_string)
            .collect();
        write!(f, "{}", shown.join(" "))?;
        if self.variadic {
            f.write_str("...")?;
        }
        Ok(())
    }
}

/// One overload of a function.
#[derive(Clone)]
pub struct Form {
    signature: Signature,
    call: Call,
}

impl Form {
    pub fn new<F>(params: &[Param], call: F) -> Self
    where
        F: for<'a> Fn(Args<'a>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Form {
            signature: Signature { params: params.to_vec(), variadic: false },
            call: Arc::new(call),
        }
    }

    /// A form whose last parameter repeats. It never matches a call that
    /// leaves the repeating parameter without arguments.
    pub fn variadic<F>(params: &[Param], call: F) -> Self
    where
        F: for<'a> Fn(Args<'a>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Form {
            signature: Signature { params: params.to_vec(), variadic: true },
            call: Arc::new(call),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Binds the arguments, or reports the first argument that did not fit.
    fn bind<'a>(
        &self,
        ctx: &'a Context,
        exprs: &'a [Expr],
        cache: &mut ArgCache,
    ) -> Result<Binding<'a>, EvalError> {
        let (min, max) = self.signature.arity();
        if exprs.len() < min || max.is_some_and(|max| exprs.len() > max) {
            return Ok(Binding::Mismatch(None));
        }

        let mut fixed = Vec::with_capacity(self.signature.params.len());
        let mut rest = Vec::new();
        let mut cursor = 0;
        let last = self.signature.params.len().saturating_sub(1);

        for (i, param) in self.signature.params.iter().enumerate() {
            if !param.consumes_argument() {
                fixed.push(Arg::Context(ctx));
                continue;
            }
            if self.signature.variadic && i == last {
                while cursor < exprs.len() {
                    match consume(*param, ctx, exprs, cursor, cache)? {
                        Some(arg) => rest.push(arg),
                        None => return Ok(Binding::Mismatch(Some(cursor))),
                    }
                    cursor += 1;
                }
                break;
            }
            match consume(*param, ctx, exprs, cursor, cache)? {
                Some(arg) => fixed.push(arg),
                None => return Ok(Binding::Mismatch(Some(cursor))),
            }
            cursor += 1;
        }

        if cursor != exprs.len() {
            return Ok(Binding::Mismatch(Some(cursor)));
        }
        Ok(Binding::Matched(Args { fixed, rest }))
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form").field("signature", &self.signature).finish()
    }
}

enum Binding<'a> {
    Matched(Args<'a>),
    Mismatch(Option<usize>),
}

/// Argument values evaluated so far. Each argument expression is
/// evaluated at most once per call, however many forms are tried.
struct ArgCache(Vec<Option<Value>>);

impl ArgCache {
    fn value(&mut self, ctx: &Context, exprs: &[Expr], index: usize) -> Result<&Value, EvalError> {
        let slot = &mut self.0[index];
        if slot.is_none() {
            // Changes an argument makes to its context stay inside it.
            let (_, value) = eval_expr(ctx, &exprs[index])?;
            *slot = Some(value);
        }
        slot.as_ref()
            .ok_or_else(|| EvalError::Argument(format!("argument {index} was not evaluated")))
    }
}

/// Converts one argument for `param`. `Ok(None)` is a non-match; errors
/// from evaluating the argument itself are hard errors.
fn consume<'a>(
    param: Param,
    ctx: &'a Context,
    exprs: &'a [Expr],
    index: usize,
    cache: &mut ArgCache,
) -> Result<Option<Arg<'a>>, EvalError> {
    if param == Param::Expression {
        return Ok(Some(Arg::Expression(&exprs[index])));
    }
    let value = cache.value(ctx, exprs, index)?;
    let coalescer = ctx.coalescer();
    let arg = match param {
        Param::Bool => coalescer.to_bool(value).map(Arg::Bool).ok(),
        Param::Int => coalescer.to_int64(value).map(Arg::Int).ok(),
        Param::Float => coalescer.to_float64(value).map(Arg::Float).ok(),
        Param::Number => coalescer.to_number(value).map(Arg::Number).ok(),
        Param::String => coalescer.to_string(value).map(Arg::String).ok(),
        Param::Vector => coalescer.to_vector(value).map(Arg::Vector).ok(),
        Param::Object => coalescer.to_object(value).map(Arg::Object).ok(),
        Param::Any => Some(Arg::Any(value.clone())),
        Param::Expression | Param::Context => None,
    };
    Ok(arg)
}

/// A named, documented function with one or more forms.
#[derive(Clone)]
pub struct Function {
    name: String,
    description: String,
    forms: Vec<Form>,
    bang: Option<BangHandler>,
}

impl Function {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            description: description.into(),
            forms: Vec::new(),
            bang: None,
        }
    }

    /// Adds a form, tried after the ones already added.
    pub fn form(mut self, form: Form) -> Self {
        self.forms.push(form);
        self
    }

    /// Installs a custom handler for bang calls.
    pub fn bang<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Context, &[Expr]) -> Result<(Context, Value), EvalError> + Send + Sync + 'static,
    {
        self.bang = Some(Arc::new(handler));
        self
    }

    /// The same function under another name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Function { name: name.into(), ..self.clone() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn bang_handler(&self) -> Option<&BangHandler> {
        self.bang.as_ref()
    }

    /// Calls the first form that accepts `args`.
    pub fn evaluate(&self, ctx: &Context, args: &[Expr]) -> Result<Value, EvalError> {
        let mut cache = ArgCache(vec![None; args.len()]);
        let mut failed_at = None;

        for (index, form) in self.forms.iter().enumerate() {
            match form.bind(ctx, args, &mut cache)? {
                Binding::Matched(bound) => {
                    tracing::trace!(function = %self.name, form = index, "form matched");
                    return (form.call)(bound);
                }
                Binding::Mismatch(at) => failed_at = at,
            }
        }

        Err(EvalError::NoMatchingForm {
            function: self.name.clone(),
            argument: if self.forms.len() == 1 { failed_at } else { None },
        })
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("forms", &self.forms)
            .field("bang", &self.bang.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coalescing::Humane;
    use crate::parser::parse;

    fn call(function: &Function, ctx: &Context, source: &str) -> Result<Value, EvalError> {
        let program = parse("test", source).unwrap();
        let exprs: Vec<Expr> = program.statements.into_iter().map(|s| s.expression).collect();
        function.evaluate(ctx, &exprs)
    }

    fn kinds() -> Function {
        Function::new("kind", "Names the form that matched")
            .form(Form::new(&[Param::Int], |_| Ok(Value::from("int"))))
            .form(Form::new(&[Param::String], |_| Ok(Value::from("string"))))
            .form(Form::new(&[Param::Any], |_| Ok(Value::from("any"))))
    }

    #[test]
    fn test_first_matching_form_wins() {
        let ctx = Context::new(Value::Null);
        assert_eq!(call(&kinds(), &ctx, "1").unwrap(), Value::from("int"));
        assert_eq!(call(&kinds(), &ctx, "\"x\"").unwrap(), Value::from("string"));
        assert_eq!(call(&kinds(), &ctx, "[1]").unwrap(), Value::from("any"));
    }

    #[test]
    fn test_coalescer_changes_which_form_matches() {
        let ctx = Context::new(Value::Null).with_coalescer(Arc::new(Humane));
        // "7" converts to an int under humane rules
        assert_eq!(call(&kinds(), &ctx, "\"7\"").unwrap(), Value::from("int"));
    }

    #[test]
    fn test_variadic_needs_one_argument() {
        let sum = Function::new("sum", "Adds integers").form(Form::variadic(&[Param::Int], |args| {
            Ok(Value::Int(args.rest_ints()?.iter().sum()))
        }));
        let ctx = Context::new(Value::Null);
        assert_eq!(call(&sum, &ctx, "1 2 3").unwrap(), Value::Int(6));
        assert!(matches!(
            sum.evaluate(&ctx, &[]),
            Err(EvalError::NoMatchingForm { argument: None, .. })
        ));
    }

    #[test]
    fn test_single_form_reports_failing_argument() {
        let f = Function::new("f", "")
            .form(Form::new(&[Param::Int, Param::Int], |_| Ok(Value::Null)));
        let ctx = Context::new(Value::Null);
        match call(&f, &ctx, "1 \"a\"") {
            Err(EvalError::NoMatchingForm { function, argument }) => {
                assert_eq!(function, "f");
                assert_eq!(argument, Some(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_arguments_evaluate_once_across_forms() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let mut functions = crate::context::Functions::new();
        functions.register(Function::new("tick", "").form(Form::new(&[], |_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from("x"))
        })));
        let ctx = Context::new(Value::Null).with_functions(functions);
        assert_eq!(call(&kinds(), &ctx, "(tick)").unwrap(), Value::from("string"));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_signature_display() {
        let form = Form::variadic(&[Param::Context, Param::String, Param::Number], |_| Ok(Value::Null));
        assert_eq!(form.signature().to_string(), "string number...");
        assert_eq!(form.signature().arity(), (2, None));
    }
}
