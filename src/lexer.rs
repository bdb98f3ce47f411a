use crate::ast::expressions::is_identifier_char;
use crate::ast::{Spanned, Token};

/// Location of a character in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the start of the source.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    location: Position,
    /// Where the previous token ended, for adjacency.
    last_end: Option<usize>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            location: Position { offset: 0, line: 1, column: 1 },
            last_end: None,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.location.offset += ch.len_utf8();
            if ch == '\n' {
                self.location.line += 1;
                self.location.column = 1;
            } else {
                self.location.column += 1;
            }
            self.position += 1;
        }
    }

    fn error(&self, message: impl Into<String>, position: Position) -> LexError {
        LexError { message: message.into(), position }
    }

    /// Skips whitespace, commas and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() || ch == ',' {
                self.advance();
            } else if ch == '#' {
                while let Some(ch) = self.current_char() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_identifier_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self) -> Result<String, LexError> {
        let start = self.location;
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    let escape_at = self.location;
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\\') => result.push('\\'),
                        Some('/') => result.push('/'),
                        Some('u') => {
                            result.push(self.read_unicode_escape(escape_at)?);
                            continue;
                        }
                        Some(ch) => {
                            return Err(self.error(format!("invalid escape sequence \\{ch}"), escape_at));
                        }
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("unterminated string", start))
    }

    /// Reads the `XXXX` of a `\uXXXX` escape; the cursor sits on the `u`.
    fn read_unicode_escape(&mut self, escape_at: Position) -> Result<char, LexError> {
        self.advance();
        let mut hex = String::new();
        for _ in 0..4 {
            match self.current_char() {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    hex.push(ch);
                    self.advance();
                }
                _ => return Err(self.error("invalid unicode escape", escape_at)),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("invalid unicode escape \\u{hex}"), escape_at))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.location;
        let mut number = String::new();
        let mut is_float = false;

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E') && self.exponent_follows() {
                is_float = true;
                number.push(ch);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current_char() {
                    number.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        if is_float {
            number
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.error(format!("invalid number {number}"), start))
        } else {
            number
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| self.error(format!("integer out of range: {number}"), start))
        }
    }

    fn exponent_follows(&self) -> bool {
        match self.peek_char(1) {
            Some('+' | '-') => self.peek_char(2).is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_trivia();

        let position = self.location;
        let adjacent = self.last_end == Some(self.position);

        let token = match self.current_char() {
            None => Token::Eof,
            Some('$') => {
                self.advance();
                let name = self.read_identifier();
                if name.is_empty() {
                    return Err(self.error("expected variable name after '$'", position));
                }
                Token::Variable(name)
            }
            Some('.') => {
                self.advance();
                Token::Dot
            }
            Some('(') => {
                self.advance();
                Token::LParen
            }
            Some(')') => {
                self.advance();
                Token::RParen
            }
            Some('[') => {
                self.advance();
                if self.current_char() == Some('?') {
                    self.advance();
                    Token::FilterOpen
                } else {
                    Token::LBracket
                }
            }
            Some(']') => {
                self.advance();
                Token::RBracket
            }
            Some('{') => {
                self.advance();
                Token::LBrace
            }
            Some('}') => {
                self.advance();
                Token::RBrace
            }
            Some('"') => Token::String(self.read_string()?),
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()?
            }
            Some(ch) if is_identifier_char(ch) => {
                let ident = self.read_identifier();

                match ident.as_str() {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    _ => Token::Identifier(ident),
                }
            }
            Some(ch) => {
                return Err(self.error(format!("unexpected character '{ch}'"), position));
            }
        };

        self.last_end = Some(self.position);
        Ok(Spanned { token, position, adjacent })
    }

    /// Lexes the whole input, ending with [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}
