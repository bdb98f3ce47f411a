//! # Quill - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for Quill, a small
//! Lisp-like language for querying and editing JSON-shaped documents.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, symbols, calls, paths)
//! - **[statements]** - Top-level statements
//! - **[program]** - A complete parsed script and its entry points
//!
//! ## Quick Start
//!
//! ```text
//! (filter .users $u (gte $u.age 18))
//! ```
//!
//! This keeps the users that are at least 18 years old.
//!
//! ## Core Concepts
//!
//! ### Symbols and Paths
//!
//! `.` is the document and `$name` a variable. Steps written directly after
//! them (no whitespace) walk into the value:
//!
//! ```text
//! .items[0].name
//! $user["first name"]
//! .items[?(gt .price 10)]
//! ```
//!
//! Vector and object literals accept the same steps: `[1 2 3][0]`.
//!
//! ### Calls
//!
//! A call is a parenthesised list whose head names a function. A trailing
//! `!` turns it into a bang call, which writes its result back into the
//! variable or document its first argument points at:
//!
//! ```text
//! (append $list 4)     # returns a new vector, $list unchanged
//! (append! $list 4)    # $list now ends with 4
//! ```
//!
//! ### Scoping
//!
//! Variables are scoped: a variable set inside a call's arguments or a
//! function body is not visible once the call returns. The document is
//! shared, so document writes are always visible.
pub mod tokens;
pub mod expressions;
pub mod statements;
pub mod program;

pub use tokens::{Spanned, Token};
pub use expressions::{Expr, Identifier, ObjectNode, PathExpr, PathStep, Symbol, Tuple, VectorNode};
pub use statements::Statement;
pub use program::Program;
