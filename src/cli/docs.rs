//! Documentation for the quill CLI, generated from the built-in library

use std::fmt::Write;

use super::CliError;
use crate::builtins;

const SYNTAX: &str = r#"QUILL

Quill scripts query and edit a JSON document. A script is a sequence of
expressions; the value of the last one is the result.

SYNTAX

  null true false 42 -1.5 "text"    Literals
  [1 2 3]  {name "x" age 3}         Vectors and objects (commas optional)
  .  .items[0].name  ."odd key"     The document and paths into it
  $var  $var.field                  Variables and paths into them
  .items[?(gt .price 10)]           Filter: keeps items the predicate accepts
  (fn arg ...)                      Function call
  (fn! $var arg ...)                Bang call: applies fn at the path and
                                    stores the result back
  # comment                         Until end of line

EXAMPLES

  (set! .total (+ .a .b))
  (map .items $item $item.name)
  (func! double [$n] (* $n 2))  (double 21)
"#;

/// Get the docs overview: syntax summary and every built-in function.
pub fn docs_overview() -> String {
    let functions = builtins::all();
    let mut out = String::from(SYNTAX);
    out.push_str("\nFUNCTIONS\n\n");
    for function in functions.fixed() {
        let _ = writeln!(out, "  {:<14}{}", function.name(), function.description());
    }
    out.push_str("\nRun 'quill docs <function>' for the forms a function accepts.\n");
    out
}

/// Get documentation for one function.
pub fn function_doc(name: &str) -> Result<String, CliError> {
    let functions = builtins::all();
    let function = functions
        .get(name)
        .ok_or_else(|| CliError::UnknownFunction(name.to_string()))?;

    let mut out = format!("{}\n\n  {}\n\nFORMS\n\n", function.name(), function.description());
    for form in function.forms() {
        let signature = form.signature().to_string();
        if signature.is_empty() {
            let _ = writeln!(out, "  ({})", function.name());
        } else {
            let _ = writeln!(out, "  ({} {signature})", function.name());
        }
    }
    if function.bang_handler().is_some() {
        let _ = writeln!(out, "\n  `{}!` has its own bang behavior; see the description.", function.name());
    }
    Ok(out)
}
