//! Run quill scripts against JSON input

use std::sync::Arc;

use super::CliError;
use crate::coalescing::{self, Coalescer};
use crate::context::{CancellationToken, Variables};
use crate::value::Value;
use crate::{builtins, parse};

/// Options for the run command
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Script source
    pub script: String,
    /// Name used in error messages
    pub script_name: String,
    /// JSON document; null when absent
    pub input: Option<String>,
    /// `name=JSON` bindings
    pub variables: Vec<String>,
    /// Coalescer name
    pub coalescer: String,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            script: String::new(),
            script_name: "<script>".to_string(),
            input: None,
            variables: Vec::new(),
            coalescer: "strict".to_string(),
            syntax_only: false,
        }
    }
}

/// Result of a run
#[derive(Debug)]
pub enum RunResult {
    /// Syntax validation passed
    SyntaxValid,
    /// The value of the last statement and the document as the script left it
    Success { value: Value, document: Value },
}

/// Parses `name=JSON`. A value that is not valid JSON binds as a string.
pub fn parse_variable(binding: &str) -> Result<(String, Value), CliError> {
    let Some((name, raw)) = binding.split_once('=') else {
        return Err(CliError::InvalidVariable(binding.to_string()));
    };
    let name = name.trim().trim_start_matches('$');
    if name.is_empty() {
        return Err(CliError::InvalidVariable(binding.to_string()));
    }
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Value::from(json),
        Err(_) => Value::from(raw),
    };
    Ok((name.to_string(), value))
}

/// Execute a run operation
pub fn execute_run(options: &RunOptions) -> Result<RunResult, CliError> {
    let program = parse(&options.script_name, &options.script)?;
    if options.syntax_only {
        return Ok(RunResult::SyntaxValid);
    }

    let coalescer: Arc<dyn Coalescer> = coalescing::by_name(&options.coalescer)
        .ok_or_else(|| CliError::UnknownCoalescer(options.coalescer.clone()))?;
    let document = match &options.input {
        Some(json) => Value::from(serde_json::from_str::<serde_json::Value>(json)?),
        None => Value::Null,
    };
    let variables = options
        .variables
        .iter()
        .map(|binding| parse_variable(binding))
        .collect::<Result<Variables, CliError>>()?;

    tracing::debug!(
        script = %options.script_name,
        coalescer = coalescer.name(),
        variables = variables.len(),
        "running script"
    );
    let (document, value) = program.run(
        &CancellationToken::new(),
        document,
        variables,
        builtins::all(),
        coalescer,
    )?;
    Ok(RunResult::Success { value, document })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(script: &str, input: Option<&str>) -> RunOptions {
        RunOptions {
            script: script.to_string(),
            input: input.map(str::to_string),
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_run_returns_value_and_document() {
        let result = execute_run(&options("(set! .a 2) (+ .a 1)", Some(r#"{"a": 1}"#))).unwrap();
        match result {
            RunResult::Success { value, document } => {
                assert_eq!(value, Value::Int(3));
                assert_eq!(document, Value::from(serde_json::json!({"a": 2})));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_syntax_only_skips_evaluation() {
        let mut opts = options("(error \"boom\")", None);
        opts.syntax_only = true;
        assert!(matches!(execute_run(&opts).unwrap(), RunResult::SyntaxValid));
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(parse_variable("n=3").unwrap(), ("n".to_string(), Value::Int(3)));
        assert_eq!(parse_variable("$s=hi").unwrap(), ("s".to_string(), Value::from("hi")));
        assert!(matches!(parse_variable("oops"), Err(CliError::InvalidVariable(_))));
    }

    #[test]
    fn test_unknown_coalescer() {
        let mut opts = options("1", None);
        opts.coalescer = "lenient".to_string();
        assert!(matches!(execute_run(&opts), Err(CliError::UnknownCoalescer(_))));
    }
}
