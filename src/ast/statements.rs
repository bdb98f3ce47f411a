use std::fmt;

use crate::ast::Expr;
use crate::lexer::Position;

/// Top-level statement.
///
/// A program is a sequence of statements evaluated in order; each one sees
/// the variables and functions defined by the statements before it.
///
/// # Example
/// ```text
/// (set! $total (len .items))
/// (if (gt $total 0) "some" "none")
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub expression: Expr,
    /// Where the statement starts in the source, if it was parsed.
    pub position: Option<Position>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}
