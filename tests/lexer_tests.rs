use pretty_assertions::assert_eq;
use quill_lang::ast::{Spanned, Token};
use quill_lang::lexer::{Lexer, Position};

fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .unwrap_or_else(|e| panic!("failed to lex {input:?}: {}", e.message))
        .into_iter()
        .map(|s| s.token)
        .collect()
}

fn spanned(input: &str) -> Vec<Spanned> {
    Lexer::new(input).tokenize().unwrap()
}

fn error(input: &str) -> String {
    match Lexer::new(input).tokenize() {
        Ok(tokens) => panic!("expected an error for {input:?}, got {tokens:?}"),
        Err(e) => e.message,
    }
}

// ============================================================================
// Delimiters
// ============================================================================

#[test]
fn test_delimiters() {
    let test_cases = vec![
        ("(", Token::LParen),
        (")", Token::RParen),
        ("[", Token::LBracket),
        ("[?", Token::FilterOpen),
        ("]", Token::RBracket),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        (".", Token::Dot),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![expected, Token::Eof], "input: {input}");
    }
}

#[test]
fn test_commas_and_comments_are_whitespace() {
    assert_eq!(
        tokens("[1, 2,3] # trailing comment\n4"),
        vec![
            Token::LBracket,
            Token::Integer(1),
            Token::Integer(2),
            Token::Integer(3),
            Token::RBracket,
            Token::Integer(4),
            Token::Eof,
        ]
    );
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    let test_cases = vec![
        ("42", Token::Integer(42)),
        ("-10", Token::Integer(-10)),
        ("3.25", Token::Float(3.25)),
        ("-0.5", Token::Float(-0.5)),
        ("2e3", Token::Float(2000.0)),
        ("1.5E-2", Token::Float(0.015)),
        ("9223372036854775807", Token::Integer(i64::MAX)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![expected, Token::Eof], "input: {input}");
    }
}

#[test]
fn test_number_followed_by_dot() {
    assert_eq!(tokens("1."), vec![Token::Integer(1), Token::Dot, Token::Eof]);
}

#[test]
fn test_strings() {
    let test_cases = vec![
        (r#""hello""#, "hello"),
        (r#""""#, ""),
        (r#""tab\there""#, "tab\there"),
        (r#""line\nbreak""#, "line\nbreak"),
        (r#""quote \" inside""#, "quote \" inside"),
        (r#""back\\slash""#, "back\\slash"),
        (r#""café""#, "café"),
        (r#""\u00e9""#, "é"),
        (r#""a, b # not a comment""#, "a, b # not a comment"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            tokens(input),
            vec![Token::String(expected.to_string()), Token::Eof],
            "input: {input}"
        );
    }
}

#[test]
fn test_keywords() {
    assert_eq!(
        tokens("true false null nullable"),
        vec![
            Token::Boolean(true),
            Token::Boolean(false),
            Token::Null,
            Token::Identifier("nullable".into()),
            Token::Eof,
        ]
    );
}

// ============================================================================
// Names
// ============================================================================

#[test]
fn test_identifiers() {
    for name in ["len", "to-upper", "contains?", "set!", "+", "<=", "==", "has-prefix?", "a_b"] {
        assert_eq!(tokens(name), vec![Token::Identifier(name.into()), Token::Eof], "input: {name}");
    }
}

#[test]
fn test_minus_alone_is_an_identifier() {
    assert_eq!(
        tokens("(- 3 1)"),
        vec![
            Token::LParen,
            Token::Identifier("-".into()),
            Token::Integer(3),
            Token::Integer(1),
            Token::RParen,
            Token::Eof,
        ]
    );
}

#[test]
fn test_variables() {
    assert_eq!(
        tokens("$user $item-count"),
        vec![
            Token::Variable("user".into()),
            Token::Variable("item-count".into()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_path_tokens() {
    assert_eq!(
        tokens(".items[?(gt .price 10)].name"),
        vec![
            Token::Dot,
            Token::Identifier("items".into()),
            Token::FilterOpen,
            Token::LParen,
            Token::Identifier("gt".into()),
            Token::Dot,
            Token::Identifier("price".into()),
            Token::Integer(10),
            Token::RParen,
            Token::RBracket,
            Token::Dot,
            Token::Identifier("name".into()),
            Token::Eof,
        ]
    );
}

// ============================================================================
// Positions and adjacency
// ============================================================================

#[test]
fn test_adjacency() {
    let adjacent: Vec<bool> = spanned("$a.b $c .d").iter().map(|s| s.adjacent).collect();
    // $a . b $c . d eof
    assert_eq!(adjacent, vec![false, true, true, false, false, true, true]);
}

#[test]
fn test_positions() {
    let tokens = spanned("(len\n  \"é\" x)");
    let positions: Vec<Position> = tokens.iter().map(|s| s.position).collect();
    assert_eq!(positions[0], Position { offset: 0, line: 1, column: 1 });
    assert_eq!(positions[1], Position { offset: 1, line: 1, column: 2 });
    assert_eq!(positions[2], Position { offset: 7, line: 2, column: 3 });
    // "é" is two bytes but one column
    assert_eq!(positions[3], Position { offset: 12, line: 2, column: 7 });
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_errors() {
    assert_eq!(error(r#""open"#), "unterminated string");
    assert_eq!(error("$ x"), "expected variable name after '$'");
    assert_eq!(error("@"), "unexpected character '@'");
    assert_eq!(error(r#""\q""#), "invalid escape sequence \\q");
    assert_eq!(error("99999999999999999999"), "integer out of range: 99999999999999999999");
}

#[test]
fn test_error_position() {
    let err = Lexer::new("(len\n  ;)").tokenize().unwrap_err();
    assert_eq!(err.position, Position { offset: 7, line: 2, column: 3 });
}
