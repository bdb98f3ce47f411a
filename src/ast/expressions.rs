use std::fmt;

use crate::output::escape_string;
use crate::value::Value;

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Expressions are immutable once parsed and may be evaluated any number of
/// times, from any thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Null literal
    Null,

    /// Boolean literal
    Bool(bool),

    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// Literal floating point number
    ///
    /// # Example
    /// ```text
    /// 42.5
    /// ```
    Float(f64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "hello"
    /// ```
    String(String),

    /// Bare name. Only meaningful as the head of a [`Tuple`] or as a naming
    /// token consumed unevaluated by a special form.
    Identifier(Identifier),

    /// Document root or variable, with an optional path
    ///
    /// # Examples
    /// ```text
    /// .
    /// .items[0].name
    /// $user.email
    /// ```
    Symbol(Symbol),

    /// Function call
    ///
    /// # Example
    /// ```text
    /// (concat ", " $names)
    /// ```
    Tuple(Tuple),

    /// Vector literal
    ///
    /// # Example
    /// ```text
    /// [1 2 (+ 1 2)]
    /// ```
    Vector(VectorNode),

    /// Object literal
    ///
    /// # Example
    /// ```text
    /// {name "Alice" age 30}
    /// ```
    Object(ObjectNode),

    /// Already evaluated value, returned as-is.
    Shim(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    /// Written with a trailing `!`, requesting an in-place update.
    pub bang: bool,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Identifier { name: name.into(), bang: false }
    }

    pub fn bang(name: impl Into<String>) -> Self {
        Identifier { name: name.into(), bang: true }
    }

    /// Splits a trailing `!` off a raw identifier token.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix('!') {
            Some(name) if !name.is_empty() => Identifier::bang(name),
            _ => Identifier::new(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// `None` refers to the document root.
    pub variable: Option<String>,
    pub path: Option<PathExpr>,
}

impl Symbol {
    pub fn root() -> Self {
        Symbol { variable: None, path: None }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Symbol { variable: Some(name.into()), path: None }
    }

    pub fn with_path(mut self, path: PathExpr) -> Self {
        self.path = Some(path);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    /// The first expression names the function.
    pub expressions: Vec<Expr>,
}

impl Tuple {
    pub fn head(&self) -> Option<&Identifier> {
        match self.expressions.first() {
            Some(Expr::Identifier(ident)) => Some(ident),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Expr] {
        self.expressions.get(1..).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorNode {
    pub expressions: Vec<Expr>,
    pub path: Option<PathExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub pairs: Vec<(Expr, Expr)>,
    pub path: Option<PathExpr>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathExpr {
    pub steps: Vec<PathStep>,
}

impl PathExpr {
    pub fn new(steps: Vec<PathStep>) -> Self {
        PathExpr { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn has_filters(&self) -> bool {
        self.steps.iter().any(|s| matches!(s, PathStep::Filter(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// Evaluates to an index (integer) or a key (string).
    Expr(Expr),
    /// Predicate evaluated once per element, with `.` bound to the element.
    Filter(Expr),
}

/// Keys that can be written as `.key` rather than `["key"]`.
pub(crate) fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(is_identifier_char),
        _ => false,
    }
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || "-_+*/<>=!?%&".contains(c)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Null => f.write_str("null"),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Integer(n) => write!(f, "{n}"),
            Expr::Float(n) => write!(f, "{n:?}"),
            Expr::String(s) => write!(f, "\"{}\"", escape_string(s)),
            Expr::Identifier(ident) => write!(f, "{ident}"),
            Expr::Symbol(symbol) => write!(f, "{symbol}"),
            Expr::Tuple(tuple) => {
                f.write_str("(")?;
                write_spaced(f, &tuple.expressions)?;
                f.write_str(")")
            }
            Expr::Vector(node) => {
                f.write_str("[")?;
                write_spaced(f, &node.expressions)?;
                f.write_str("]")?;
                write_path(f, node.path.as_ref())
            }
            Expr::Object(node) => {
                f.write_str("{")?;
                for (i, (key, value)) in node.pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{key} {value}")?;
                }
                f.write_str("}")?;
                write_path(f, node.path.as_ref())
            }
            Expr::Shim(value) => write_value(f, value),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.bang {
            f.write_str("!")?;
        }
        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps = self.path.as_ref().map(ToString::to_string).unwrap_or_default();
        match &self.variable {
            Some(name) => write!(f, "${name}{steps}"),
            // `.foo` already starts with the root dot
            None if steps.starts_with('.') => f.write_str(&steps),
            None => write!(f, ".{steps}"),
        }
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                PathStep::Expr(Expr::String(key)) if is_bare_key(key) => write!(f, ".{key}")?,
                PathStep::Expr(expr) => write!(f, "[{expr}]")?,
                PathStep::Filter(expr) => write!(f, "[?{expr}]")?,
            }
        }
        Ok(())
    }
}

fn write_spaced(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{expr}")?;
    }
    Ok(())
}

fn write_path(f: &mut fmt::Formatter<'_>, path: Option<&PathExpr>) -> fmt::Result {
    match path {
        Some(path) => write!(f, "{path}"),
        None => Ok(()),
    }
}

/// Renders a value as source that evaluates back to it.
fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Int(n) => write!(f, "{n}"),
        Value::Float(n) => write!(f, "{n:?}"),
        Value::String(s) => write!(f, "\"{}\"", escape_string(s)),
        Value::Vector(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write_value(f, item)?;
            }
            f.write_str("]")
        }
        Value::Object(map) => {
            f.write_str("{")?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "\"{}\" ", escape_string(key))?;
                write_value(f, item)?;
            }
            f.write_str("}")
        }
        Value::Host(host) => write!(f, "<{}>", host.type_name()),
    }
}
