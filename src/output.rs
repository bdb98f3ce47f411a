//! JSON output serialization for Quill values.
//!
//! This module provides JSON serialization with support for both compact and
//! pretty-printed output formats. All output is deterministic (object keys are
//! sorted) and follows standard JSON formatting rules.
//!
//! # Features
//!
//! - **Compact output** via [`to_json()`] - minimal whitespace, used by `to-json` and `Display`
//! - **Pretty output** via [`to_json_pretty()`] - human-readable with 2-space indentation
//! - **Type preservation** - floats always carry a fraction or exponent (`1.0`, not `1`)
//! - **Host values** - rendered through their plain form, or as `"<type>"`
//!
//! # Examples
//!
//! ```
//! use quill_lang::Value;
//! use quill_lang::output::{to_json, to_json_pretty};
//!
//! let value = Value::Float(2.0);
//!
//! // Compact output
//! assert_eq!(to_json(&value), "2.0");
//!
//! // Pretty output (identical for simple values)
//! assert_eq!(to_json_pretty(&value), "2.0");
//! ```

use crate::value::{Map, Value};

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        self.print_value(value, 0)
    }

    fn print_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            // JSON has no NaN or infinity
            Value::Float(n) if !n.is_finite() => "null".to_string(),
            Value::Float(n) => format!("{n:?}"),
            Value::String(s) => format!("\"{}\"", escape_string(s)),
            Value::Vector(items) => self.print_vector(items, indent),
            Value::Object(map) => self.print_object(map, indent),
            Value::Host(host) => match host.to_value() {
                Some(plain) => self.print_value(&plain, indent),
                None => format!("\"<{}>\"", escape_string(host.type_name())),
            },
        }
    }

    fn print_vector(&self, items: &[Value], indent: usize) -> String {
        if items.is_empty() {
            return "[]".to_string();
        }

        if self.pretty {
            let mut result = "[\n".to_string();
            let lines: Vec<String> = items
                .iter()
                .map(|v| {
                    format!(
                        "{}{}",
                        self.indent(indent + 1),
                        self.print_value(v, indent + 1)
                    )
                })
                .collect();
            result.push_str(&lines.join(",\n"));
            result.push('\n');
            result.push_str(&self.indent(indent));
            result.push(']');
            result
        } else {
            let parts: Vec<String> = items.iter().map(|v| self.print_value(v, indent)).collect();
            format!("[{}]", parts.join(","))
        }
    }

    fn print_object(&self, map: &Map, indent: usize) -> String {
        if map.is_empty() {
            return "{}".to_string();
        }

        if self.pretty {
            let mut result = "{\n".to_string();
            let lines: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}\"{}\": {}",
                        self.indent(indent + 1),
                        escape_string(k),
                        self.print_value(v, indent + 1)
                    )
                })
                .collect();
            result.push_str(&lines.join(",\n"));
            result.push('\n');
            result.push_str(&self.indent(indent));
            result.push('}');
            result
        } else {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("\"{}\":{}", escape_string(k), self.print_value(v, indent)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }
}

/// Escapes a string for a double-quoted JSON or Quill literal.
pub(crate) fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        })
        .collect()
}

// Convenience functions

/// Converts a Value to compact JSON string representation.
///
/// # Examples
///
/// ```
/// use quill_lang::{Map, Value};
/// use quill_lang::output::to_json;
///
/// let mut obj = Map::new();
/// obj.insert("name".to_string(), Value::String("Alice".to_string()));
/// obj.insert("age".to_string(), Value::Int(30));
///
/// assert_eq!(to_json(&Value::Object(obj)), r#"{"age":30,"name":"Alice"}"#);
/// ```
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Converts a Value to pretty-printed JSON string representation.
///
/// # Examples
///
/// ```
/// use quill_lang::{Map, Value};
/// use quill_lang::output::to_json_pretty;
///
/// let mut obj = Map::new();
/// obj.insert("name".to_string(), Value::String("Alice".to_string()));
/// obj.insert("age".to_string(), Value::Int(30));
///
/// let json = to_json_pretty(&Value::Object(obj));
/// assert_eq!(json, "{\n  \"age\": 30,\n  \"name\": \"Alice\"\n}");
/// ```
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}
