use crate::{
    ast::{
        Expr, Identifier, ObjectNode, PathExpr, PathStep, Program, Spanned, Statement, Symbol,
        Token, Tuple, VectorNode,
    },
    lexer::{LexError, Lexer, Position},
};
use std::fmt;
use std::mem;

const TAB_WIDTH: usize = 8;

/// A syntax error, located in the script it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Name the script was parsed under.
    pub script: String,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    /// The full source line containing the error.
    pub line_text: String,
}

impl ParseError {
    fn new(script: &str, source: &str, message: impl Into<String>, at: Position) -> Self {
        let line_text = source
            .lines()
            .nth(at.line.saturating_sub(1))
            .unwrap_or_default()
            .to_string();
        ParseError {
            script: script.to_string(),
            message: message.into(),
            line: at.line,
            column: at.column,
            offset: at.offset,
            line_text,
        }
    }

    /// The offending line with a caret under the error column.
    ///
    /// Tabs are expanded to eight spaces so the caret lines up.
    pub fn snippet(&self) -> String {
        let line: String = self
            .line_text
            .chars()
            .map(|c| if c == '\t' { " ".repeat(TAB_WIDTH) } else { c.to_string() })
            .collect();
        let indent: usize = self
            .line_text
            .chars()
            .take(self.column.saturating_sub(1))
            .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
            .sum();
        format!("{line}\n{}^", " ".repeat(indent))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:{}:{}: {}", self.script, self.line, self.column, self.message)?;
        write!(f, "{}", self.snippet())
    }
}

impl std::error::Error for ParseError {}

/// Parses `source` into a [`Program`]. `name` labels errors.
///
/// # Examples
///
/// ```
/// let program = quill_lang::parse("example", "(len .items)").unwrap();
/// assert_eq!(program.statements.len(), 1);
/// ```
pub fn parse(name: &str, source: &str) -> Result<Program, ParseError> {
    let mut parser = Parser::new(name, source)?;
    parser.parse_program()
}

pub struct Parser<'a> {
    name: &'a str,
    source: &'a str,
    lexer: Lexer,
    current: Spanned,
}

impl<'a> Parser<'a> {
    pub fn new(name: &'a str, source: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer
            .next_token()
            .map_err(|e| lex_error(name, source, e))?;
        Ok(Parser { name, source, lexer, current })
    }

    fn advance(&mut self) -> Result<Spanned, ParseError> {
        let next = self
            .lexer
            .next_token()
            .map_err(|e| lex_error(self.name, self.source, e))?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn error(&self, message: impl Into<String>, at: Position) -> ParseError {
        ParseError::new(self.name, self.source, message, at)
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ParseError> {
        if self.current.token != expected {
            let found = match &self.current.token {
                Token::Eof => "end of input".to_string(),
                token => describe(token),
            };
            return Err(self.error(format!("expected {what}, found {found}"), self.current.position));
        }
        self.advance()?;
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while !self.check(&Token::Eof) {
            let position = self.current.position;
            let expression = self.parse_expression()?;
            statements.push(Statement { expression, position: Some(position) });
        }
        Ok(Program::new(self.name, statements))
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.position;
        match self.advance()?.token {
            // Literals
            Token::Integer(n) => Ok(Expr::Integer(n)),
            Token::Float(n) => Ok(Expr::Float(n)),
            Token::String(s) => Ok(Expr::String(s)),
            Token::Boolean(b) => Ok(Expr::Bool(b)),
            Token::Null => Ok(Expr::Null),
            Token::Identifier(name) => Ok(Expr::Identifier(Identifier::parse(&name))),

            // References
            Token::Dot => {
                let mut steps = Vec::new();
                if self.current.adjacent {
                    if let Some(key) = self.key_name() {
                        self.advance()?;
                        steps.push(PathStep::Expr(Expr::String(key)));
                    }
                }
                self.parse_steps(&mut steps)?;
                Ok(Expr::Symbol(Symbol { variable: None, path: path_from(steps) }))
            }
            Token::Variable(name) => {
                let mut steps = Vec::new();
                self.parse_steps(&mut steps)?;
                Ok(Expr::Symbol(Symbol { variable: Some(name), path: path_from(steps) }))
            }

            Token::LParen => self.parse_tuple(start),
            Token::LBracket => {
                let mut expressions = Vec::new();
                while !self.check(&Token::RBracket) {
                    if self.check(&Token::Eof) {
                        return Err(self.error("unclosed '['", start));
                    }
                    expressions.push(self.parse_expression()?);
                }
                self.advance()?;
                let mut steps = Vec::new();
                self.parse_steps(&mut steps)?;
                Ok(Expr::Vector(VectorNode { expressions, path: path_from(steps) }))
            }
            Token::LBrace => {
                let pairs = self.parse_object_pairs(start)?;
                let mut steps = Vec::new();
                self.parse_steps(&mut steps)?;
                Ok(Expr::Object(ObjectNode { pairs, path: path_from(steps) }))
            }

            Token::Eof => Err(self.error("unexpected end of input", start)),
            token => Err(self.error(format!("unexpected {}", describe(&token)), start)),
        }
    }

    fn parse_tuple(&mut self, start: Position) -> Result<Expr, ParseError> {
        let head = match &self.current.token {
            Token::Identifier(name) => Identifier::parse(name),
            Token::RParen => return Err(self.error("empty call: expected function name", start)),
            _ => {
                let at = self.current.position;
                return Err(self.error("expected function name", at));
            }
        };
        self.advance()?;

        let mut expressions = vec![Expr::Identifier(head)];
        while !self.check(&Token::RParen) {
            if self.check(&Token::Eof) {
                return Err(self.error("unclosed '('", start));
            }
            expressions.push(self.parse_expression()?);
        }
        self.advance()?;
        Ok(Expr::Tuple(Tuple { expressions }))
    }

    fn parse_object_pairs(&mut self, start: Position) -> Result<Vec<(Expr, Expr)>, ParseError> {
        let mut pairs = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.check(&Token::Eof) {
                return Err(self.error("unclosed '{'", start));
            }
            // Bare identifiers name the key directly
            let key = match &self.current.token {
                Token::Identifier(name) => {
                    let key = Expr::String(name.clone());
                    self.advance()?;
                    key
                }
                _ => self.parse_expression()?,
            };
            if self.check(&Token::RBrace) {
                let at = self.current.position;
                return Err(self.error(format!("missing value for key {key}"), at));
            }
            let value = self.parse_expression()?;
            pairs.push((key, value));
        }
        self.advance()?;
        Ok(pairs)
    }

    /// Collects the steps written directly after a node.
    fn parse_steps(&mut self, steps: &mut Vec<PathStep>) -> Result<(), ParseError> {
        while self.current.adjacent {
            match self.current.token {
                Token::Dot => {
                    let dot = self.advance()?;
                    let key = match self.key_name() {
                        Some(key) if self.current.adjacent => key,
                        _ => return Err(self.error("expected key after '.'", dot.position)),
                    };
                    self.advance()?;
                    steps.push(PathStep::Expr(Expr::String(key)));
                }
                Token::LBracket => {
                    self.advance()?;
                    let expr = self.parse_expression()?;
                    self.expect(Token::RBracket, "']'")?;
                    steps.push(PathStep::Expr(expr));
                }
                Token::FilterOpen => {
                    self.advance()?;
                    let expr = self.parse_expression()?;
                    self.expect(Token::RBracket, "']'")?;
                    steps.push(PathStep::Filter(expr));
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// A key written after a dot: an identifier, string or keyword.
    fn key_name(&self) -> Option<String> {
        match &self.current.token {
            Token::Identifier(name) | Token::String(name) => Some(name.clone()),
            Token::Boolean(b) => Some(b.to_string()),
            Token::Null => Some("null".to_string()),
            _ => None,
        }
    }
}

fn path_from(steps: Vec<PathStep>) -> Option<PathExpr> {
    (!steps.is_empty()).then(|| PathExpr::new(steps))
}

fn lex_error(name: &str, source: &str, error: LexError) -> ParseError {
    ParseError::new(name, source, error.message, error.position)
}

fn describe(token: &Token) -> String {
    match token {
        Token::Integer(n) => format!("number {n}"),
        Token::Float(n) => format!("number {n}"),
        Token::String(s) => format!("string \"{s}\""),
        Token::Boolean(b) => format!("'{b}'"),
        Token::Null => "'null'".to_string(),
        Token::Identifier(name) => format!("identifier '{name}'"),
        Token::Variable(name) => format!("variable '${name}'"),
        Token::Dot => "'.'".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::LBracket => "'['".to_string(),
        Token::FilterOpen => "'[?'".to_string(),
        Token::RBracket => "']'".to_string(),
        Token::LBrace => "'{'".to_string(),
        Token::RBrace => "'}'".to_string(),
        Token::Eof => "end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_expands_tabs() {
        let err = parse("t", "\t(foo ]").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 7);
        assert_eq!(err.snippet(), format!("{}(foo ]\n{}^", " ".repeat(8), " ".repeat(13)));
    }
}
