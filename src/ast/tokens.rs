use crate::lexer::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -10
    /// ```
    Integer(i64),

    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// -1.0
    /// 2e10
    /// ```
    Float(f64),

    /// String literal enclosed in double quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "tab\tseparated"
    /// ```
    String(String),

    /// Boolean values (`true` / `false`)
    Boolean(bool),

    /// Null value
    Null,

    /// Function name, naming token or object key
    ///
    /// Consists of letters, digits and `- _ + * / < > = ! ? % &`. A trailing
    /// `!` is kept here; the parser turns it into a bang flag.
    ///
    /// # Examples
    /// ```text
    /// to-upper
    /// contains?
    /// set!
    /// +
    /// ```
    Identifier(String),

    /// Variable reference
    ///
    /// # Examples
    /// ```text
    /// $user
    /// $item-count
    /// ```
    Variable(String),

    /// Document root, or the separator before a key step
    ///
    /// # Examples
    /// ```text
    /// .
    /// .items
    /// $user.name
    /// ```
    Dot,

    // Delimiters
    /// Opens a function call
    LParen,

    /// Closes a function call
    RParen,

    /// Opens a vector literal or an index/key step
    LBracket,

    /// Opens a filter step (`[?`)
    ///
    /// # Examples
    /// ```text
    /// .items[?(gt .price 10)]
    /// ```
    FilterOpen,

    /// Closes a vector literal or a step
    RBracket,

    /// Opens an object literal
    LBrace,

    /// Closes an object literal
    RBrace,

    /// End of input
    Eof,
}

/// A token together with where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: Position,
    /// No whitespace or comment separates this token from the previous one.
    /// Path steps only attach to the node they directly follow.
    pub adjacent: bool,
}
