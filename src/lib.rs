//! Quill: an embeddable, Lisp-like language for querying and editing
//! JSON-shaped documents.
//!
//! A script is parsed once into a [`Program`] and can then be run any
//! number of times against different documents and variable bindings.
//!
//! ```
//! use std::sync::Arc;
//! use quill_lang::{builtins, coalescing::Strict, parse, CancellationToken, Value, Variables};
//!
//! let program = parse("example", "(append! .tags \"new\") (len .tags)").unwrap();
//! let document = Value::from(serde_json::json!({"tags": ["a"]}));
//! let (document, count) = program
//!     .run(&CancellationToken::new(), document, Variables::new(), builtins::all(), Arc::new(Strict))
//!     .unwrap();
//! assert_eq!(count, Value::Int(2));
//! assert_eq!(document, Value::from(serde_json::json!({"tags": ["a", "new"]})));
//! ```

pub mod ast;
pub mod builtins;
#[cfg(feature = "cli")]
pub mod cli;
pub mod coalescing;
pub mod context;
pub mod evaluator;
pub mod functions;
pub mod host;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod path;
pub mod value;

pub use ast::{Expr, Program, Statement, Token};
pub use coalescing::{Coalescer, CoercionError};
pub use context::{CancellationToken, Context, Document, Functions, Variables};
pub use evaluator::{EvalError, eval_expr, eval_program};
pub use functions::{Form, Function, Param};
pub use host::{Host, HostValue};
pub use lexer::{LexError, Lexer, Position};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, parse};
pub use path::PathError;
pub use value::{Map, Number, Value};
