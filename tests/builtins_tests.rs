use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_lang::coalescing::Strict;
use quill_lang::{CancellationToken, EvalError, Value, Variables, builtins, parse};
use serde_json::json;

fn eval(script: &str) -> Result<Value, EvalError> {
    let program = parse("builtins", script).unwrap();
    program
        .run(
            &CancellationToken::new(),
            Value::Null,
            Variables::new(),
            builtins::all(),
            Arc::new(Strict),
        )
        .map(|(_, value)| value)
}

fn check(script: &str, expected: serde_json::Value) {
    assert_eq!(eval(script).unwrap(), Value::from(expected), "{script}");
}

// ============================================================================
// Math
// ============================================================================

#[test]
fn test_arithmetic() {
    check("(+ 1 2 3)", json!(6));
    check("(- 10 4 1)", json!(5));
    check("(* 2 3 4)", json!(24));
    check("(add 1 2)", json!(3));
    check("(mod 7 3)", json!(1));
}

#[test]
fn test_division() {
    check("(/ 6 3)", json!(2));
    check("(/ 7 2)", json!(3.5));
    check("(div 1.5 0.5)", json!(3.0));
    assert!(matches!(eval("(/ 1 0)"), Err(EvalError::DivisionByZero)));
    assert!(matches!(eval("(mod 1 0)"), Err(EvalError::DivisionByZero)));
}

#[test]
fn test_mixed_numbers_use_decimals() {
    check("(* 1.5 2)", json!(3));
    check("(+ 0.1 2)", json!(2.1));
}

#[test]
fn test_overflow_is_an_error() {
    assert!(matches!(eval("(+ 9223372036854775807 1)"), Err(EvalError::Overflow)));
}

// ============================================================================
// Comparison and logic
// ============================================================================

#[test]
fn test_comparison() {
    check("(eq 1 1.0)", json!(true));
    check("(== \"a\" \"a\")", json!(true));
    check("(eq [1 2] [1 2])", json!(true));
    check("(lt 1 2.5)", json!(true));
    check("(< \"a\" \"b\")", json!(true));
    check("(>= 3 3)", json!(true));
    check("(gt 1 2)", json!(false));
}

#[test]
fn test_logic_short_circuits() {
    check("(and true false)", json!(false));
    check("(or false true)", json!(true));
    check("(and false (error \"unreachable\"))", json!(false));
    check("(or true (error \"unreachable\"))", json!(true));
    check("(not true)", json!(false));
    assert!(matches!(eval("(and true (error \"boom\"))"), Err(EvalError::Custom(_))));
}

// ============================================================================
// Lists and strings
// ============================================================================

#[test]
fn test_lists() {
    check("(len [1 2 3])", json!(3));
    check("(len {a 1})", json!(1));
    check("(len \"héllo\")", json!(5));
    check("(append [1] 2 3)", json!([1, 2, 3]));
    check("(prepend [3] 1 2)", json!([1, 2, 3]));
    check("(reverse [1 2 3])", json!([3, 2, 1]));
    check("(contains? [1 2] 2.0)", json!(true));
    check("(contains? {a 1} \"a\")", json!(true));
    check("(contains? \"haystack\" \"st\")", json!(true));
}

#[test]
fn test_strings() {
    check("(concat \", \" [\"a\" \"b\"])", json!("a, b"));
    check("(concat \"-\" \"a\" 1 true)", json!("a-1-true"));
    check("(split \"a,b\" \",\")", json!(["a", "b"]));
    check("(split \"ab\" \"\")", json!(["a", "b"]));
    check("(has-prefix? \"hello\" \"he\")", json!(true));
    check("(has-suffix? \"hello\" \"x\")", json!(false));
    check("(trim-prefix \"v1.2\" \"v\")", json!("1.2"));
    check("(trim-suffix \"file.json\" \".json\")", json!("file"));
    check("(to-upper \"abc\")", json!("ABC"));
    check("(trim \"  x \")", json!("x"));
    check("(replace \"a-b-c\" \"-\" \"+\")", json!("a+b+c"));
    check("(reverse \"abc\")", json!("cba"));
    check("(matches? \"abc123\" \"[0-9]+$\")", json!(true));
    assert!(matches!(eval("(matches? \"a\" \"(\")"), Err(EvalError::Argument(_))));
}

// ============================================================================
// Higher-order functions
// ============================================================================

#[test]
fn test_map_and_filter() {
    check("(map [1 2 3] $n (* $n $n))", json!([1, 4, 9]));
    check("(map {a 1 b 2} [$k $v] (concat \"=\" $k $v))", json!({"a": "a=1", "b": "b=2"}));
    check("(map null $x $x)", json!([]));
    check("(filter [1 2 3 4] $n (gt $n 2))", json!([3, 4]));
    check("(filter {a 1 b 2} [$k $v] (eq $k \"b\"))", json!({"b": 2}));
    check("(map [[1 2] [3]] $xs (len $xs))", json!([2, 1]));
    assert!(matches!(eval("(map 5 $x $x)"), Err(EvalError::TypeError(_))));
}

#[test]
fn test_filter_verdict_is_coerced() {
    assert!(eval("(filter [1 2] $n $n)").is_err());
}

#[test]
fn test_range() {
    check("(range 3)", json!([0, 1, 2]));
    check("(range 2 5)", json!([2, 3, 4]));
    check("(range 1 7 2)", json!([1, 3, 5]));
    check("(range 3 0 -1)", json!([3, 2, 1]));
    assert!(matches!(eval("(range 0 3 0)"), Err(EvalError::Argument(_))));
}

// ============================================================================
// Conversions
// ============================================================================

#[test]
fn test_conversions() {
    check("(to-int \"42\")", json!(42));
    check("(to-int 3.9)", json!(3));
    check("(to-float \"1.5\")", json!(1.5));
    check("(to-bool \"false\")", json!(false));
    check("(to-string 12)", json!("12"));
    check("(to-string [1 2])", json!("[1,2]"));
    assert!(matches!(eval("(to-int \"abc\")"), Err(EvalError::Coercion(_))));
}

#[test]
fn test_type_of() {
    check("(type-of {})", json!("object"));
    check("(type-of [])", json!("vector"));
    check("(type-of 1)", json!("int"));
    check("(type-of 1.0)", json!("float"));
    check("(type-of null)", json!("null"));
    check("(type-of \"\")", json!("string"));
}

// ============================================================================
// Encoding and hashing
// ============================================================================

#[test]
fn test_base64() {
    check("(to-base64 \"hello\")", json!("aGVsbG8="));
    check("(from-base64 \"aGVsbG8=\")", json!("hello"));
    assert!(matches!(eval("(from-base64 \"!!\")"), Err(EvalError::Argument(_))));
}

#[test]
fn test_json() {
    check("(to-json {a [1 2]})", json!("{\"a\":[1,2]}"));
    check(r#"(from-json "{\"a\": [1, null]}")"#, json!({"a": [1, null]}));
    assert!(matches!(eval("(from-json \"{\")"), Err(EvalError::Argument(_))));
}

#[test]
fn test_digests() {
    check(
        "(sha256 \"abc\")",
        json!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"),
    );
    check("(sha1 \"abc\")", json!("a9993e364706816aba3e25717850c26c9cd0d89d"));
}

// ============================================================================
// Time and errors
// ============================================================================

#[test]
fn test_now() {
    let Value::String(stamp) = eval("(now)").unwrap() else {
        panic!("expected a string");
    };
    assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok(), "{stamp}");

    let Value::String(year) = eval("(now \"%Y\")").unwrap() else {
        panic!("expected a string");
    };
    assert_eq!(year.len(), 4);
}

#[test]
fn test_error_messages() {
    let err = eval("(error \"{} of {}\" 1 [2])").unwrap_err();
    assert_eq!(err.to_string(), "1 of [2]");
    let err = eval("(error \"plain\")").unwrap_err();
    assert_eq!(err.to_string(), "plain");
}
