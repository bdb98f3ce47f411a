//! The default function library.
//!
//! [`all`] returns every built-in, ready to pass to
//! [`Program::run`](crate::Program::run) or
//! [`Context::with_functions`](crate::Context::with_functions).
//! Hosts that want a smaller surface can register functions one by one.

mod compare;
mod control;
mod date;
mod encoding;
mod hof;
mod lists;
mod logic;
mod math;
mod strings;
mod types;

use crate::context::Functions;
use crate::functions::Function;
use crate::output::to_json;
use crate::value::Value;

/// Every built-in function.
pub fn all() -> Functions {
    [
        math::functions(),
        compare::functions(),
        lists::functions(),
        strings::functions(),
        logic::functions(),
        control::functions(),
        hof::functions(),
        types::functions(),
        encoding::functions(),
        date::functions(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// The function plus one copy per alias.
fn aliased(function: Function, aliases: &[&str]) -> Vec<Function> {
    let mut out: Vec<Function> = aliases.iter().map(|alias| function.with_name(*alias)).collect();
    out.insert(0, function);
    out
}

/// Text used when a value is spliced into a string: strings as-is,
/// everything else as JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => to_json(other),
    }
}
