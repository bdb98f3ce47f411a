use std::fmt;
use std::sync::Arc;

use crate::ast::Statement;
use crate::coalescing::Coalescer;
use crate::context::{CancellationToken, Context, Functions, Variables};
use crate::evaluator::{EvalError, eval_program};
use crate::value::Value;

/// A parsed script.
///
/// Programs are immutable; one program can be run any number of times,
/// concurrently from several threads, as long as each run has its own
/// [`Context`].
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Name the script was parsed under
    pub name: String,

    /// Statements, evaluated in order
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        Program { name: name.into(), statements }
    }

    /// Runs the program against `document`.
    ///
    /// Returns the document as the program left it, and the value of the
    /// last statement.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use quill_lang::{builtins, coalescing::Strict, CancellationToken, Value, Variables};
    ///
    /// let program = quill_lang::parse("doc", "(set! .n (+ .n 1))").unwrap();
    /// let document = Value::from(serde_json::json!({"n": 1}));
    /// let (document, result) = program
    ///     .run(&CancellationToken::new(), document, Variables::new(), builtins::all(), Arc::new(Strict))
    ///     .unwrap();
    /// assert_eq!(result, Value::Int(2));
    /// assert_eq!(document, Value::from(serde_json::json!({"n": 2})));
    /// ```
    pub fn run(
        &self,
        cancellation: &CancellationToken,
        document: Value,
        variables: Variables,
        functions: Functions,
        coalescer: Arc<dyn Coalescer>,
    ) -> Result<(Value, Value), EvalError> {
        let ctx = Context::new(document)
            .with_variables(variables)
            .with_functions(functions)
            .with_coalescer(coalescer)
            .with_cancellation(cancellation.clone());
        let (ctx, result) = self.run_with_context(&ctx)?;
        Ok((ctx.document().snapshot(), result))
    }

    /// Runs the program in a caller-managed context and returns the context
    /// it leaves behind, so a REPL can carry variables and functions from
    /// one input to the next.
    #[tracing::instrument(level = "debug", skip_all, fields(script = %self.name))]
    pub fn run_with_context(&self, ctx: &Context) -> Result<(Context, Value), EvalError> {
        eval_program(ctx, self)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}
