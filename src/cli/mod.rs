//! CLI support for quill-lang
//!
//! Provides programmatic access to the `quill` commands so other tools can
//! embed them without shelling out.

mod docs;
mod run;

pub use docs::{docs_overview, function_doc};
pub use run::{RunOptions, RunResult, execute_run, parse_variable};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Parse(#[from] crate::ParseError),

    #[error("evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A `--var` that is not `name=value`
    #[error("invalid variable `{0}`: expected name=JSON")]
    InvalidVariable(String),

    #[error("unknown coalescer `{0}`: expected strict, pedantic or humane")]
    UnknownCoalescer(String),

    #[error("unknown function `{0}`\nRun 'quill docs' to see available functions.")]
    UnknownFunction(String),
}
