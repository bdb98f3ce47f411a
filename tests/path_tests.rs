use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_lang::coalescing::Strict;
use quill_lang::host::{HostValue, ObjectReader, ObjectWriter, VectorReader};
use quill_lang::path::{self, Key, NoFilter, Path, PathError, Predicate, Step};
use quill_lang::{CancellationToken, Host, Value, Variables, builtins, parse};
use serde_json::json;

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn keys(names: &[&str]) -> Path {
    names.iter().map(|name| Step::Key(name.to_string())).collect()
}

/// Keeps everything, remembering the keys it was shown.
#[derive(Debug, Default)]
struct Everything {
    seen: RefCell<Vec<Key>>,
}

impl Predicate for Everything {
    type Error = PathError;

    fn keep(&self, key: &Key, _value: &Value) -> Result<bool, PathError> {
        self.seen.borrow_mut().push(key.clone());
        Ok(true)
    }
}

/// Keeps integers above a threshold.
#[derive(Debug)]
struct Above(i64);

impl Predicate for Above {
    type Error = PathError;

    fn keep(&self, _key: &Key, value: &Value) -> Result<bool, PathError> {
        Ok(matches!(value, Value::Int(n) if *n > self.0))
    }
}

// ============================================================================
// Host values
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    fn new(fields: &[(&str, Value)]) -> Self {
        Record {
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        }
    }
}

impl HostValue for Record {
    fn type_name(&self) -> &str {
        "record"
    }

    fn clone_host(&self) -> Box<dyn HostValue> {
        Box::new(self.clone())
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Object(self.fields.clone()))
    }

    fn object_reader(&self) -> Option<&dyn ObjectReader> {
        Some(self)
    }

    fn object_writer(&mut self) -> Option<&mut dyn ObjectWriter> {
        Some(self)
    }
}

impl ObjectReader for Record {
    fn get_object_key(&self, key: &str) -> Result<Value, PathError> {
        self.fields
            .get(key)
            .cloned()
            .ok_or_else(|| PathError::NoSuchKey(key.to_string()))
    }

    fn object_keys(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }
}

impl ObjectWriter for Record {
    fn set_object_key(&mut self, key: &str, value: Value) -> Result<(), PathError> {
        self.fields.insert(key.to_string(), value);
        Ok(())
    }

    fn delete_object_key(&mut self, key: &str) -> Result<(), PathError> {
        self.fields.remove(key);
        Ok(())
    }
}

/// A vector scripts can read but not change.
#[derive(Debug, Clone)]
struct Frozen(Vec<i64>);

impl HostValue for Frozen {
    fn type_name(&self) -> &str {
        "frozen"
    }

    fn clone_host(&self) -> Box<dyn HostValue> {
        Box::new(self.clone())
    }

    fn vector_reader(&self) -> Option<&dyn VectorReader> {
        Some(self)
    }
}

impl VectorReader for Frozen {
    fn get_vector_item(&self, index: usize) -> Result<Value, PathError> {
        self.0
            .get(index)
            .map(|n| Value::Int(*n))
            .ok_or(PathError::IndexOutOfBounds {
                index: index as i64,
                len: self.0.len(),
            })
    }

    fn vector_len(&self) -> usize {
        self.0.len()
    }
}

fn record() -> Value {
    Value::Host(Host::new(Record::new(&[
        ("name", Value::from("Ada")),
        ("age", Value::Int(36)),
    ])))
}

// ============================================================================
// Plain values
// ============================================================================

#[test]
fn test_set_then_get() {
    let doc = v(json!({"a": {"b": 1}, "xs": [1, 2]}));
    for path in [keys(&["a", "b"]), keys(&["a", "c"]), keys(&["new", "deep"])] {
        let updated = path::set(&doc, &path, Value::from("x")).unwrap();
        assert_eq!(path::get(&updated, &path).unwrap(), Value::from("x"));
    }
    // the input is never mutated
    assert_eq!(doc, v(json!({"a": {"b": 1}, "xs": [1, 2]})));
}

#[test]
fn test_get_errors() {
    let doc = v(json!({"a": [1], "s": "text"}));
    assert_eq!(
        path::get(&doc, &keys(&["missing"])),
        Err(PathError::NoSuchKey("missing".into()))
    );
    let index: Path = Path::new(vec![Step::Key("a".into()), Step::Index(3)]);
    assert_eq!(
        path::get(&doc, &index),
        Err(PathError::IndexOutOfBounds { index: 3, len: 1 })
    );
    assert!(matches!(
        path::get(&doc, &keys(&["a", "b"])),
        Err(PathError::InvalidStep(_))
    ));
    assert!(matches!(
        path::get(&doc, &keys(&["s", "b"])),
        Err(PathError::Untraversable { .. })
    ));
}

#[test]
fn test_root_vivification() {
    let at_index: Path = Path::new(vec![Step::Index(0)]);
    assert!(matches!(
        path::set(&Value::Null, &at_index, Value::Int(1)),
        Err(PathError::Untraversable { .. })
    ));

    let nested: Path = Path::new(vec![Step::Key("a".into()), Step::Index(0)]);
    assert_eq!(
        path::set(&Value::Null, &nested, Value::Int(1)).unwrap(),
        v(json!({"a": [1]}))
    );

    let padded: Path = Path::new(vec![Step::Key("a".into()), Step::Index(2)]);
    assert_eq!(
        path::set(&Value::Null, &padded, Value::Int(1)).unwrap(),
        v(json!({"a": [null, null, 1]}))
    );
}

#[test]
fn test_huge_index_is_an_error() {
    let huge: Path = Path::new(vec![Step::Key("a".into()), Step::Index(4611686018427387903)]);
    assert_eq!(
        path::set(&v(json!({"a": []})), &huge, Value::Int(1)),
        Err(PathError::IndexOutOfBounds { index: 4611686018427387903, len: 0 })
    );

    let at_root: Path = Path::new(vec![Step::Index(i64::MAX)]);
    assert_eq!(
        path::set(&v(json!([1])), &at_root, Value::Int(1)),
        Err(PathError::IndexOutOfBounds { index: i64::MAX, len: 1 })
    );
}

#[test]
fn test_delete_is_idempotent() {
    let doc = v(json!({"a": {"b": 1, "c": 2}}));
    let path = keys(&["a", "b"]);
    let once = path::delete(&doc, &path).unwrap();
    let twice = path::delete(&once, &path).unwrap();
    assert_eq!(once, v(json!({"a": {"c": 2}})));
    assert_eq!(once, twice);

    let missing_parent = keys(&["x", "y"]);
    assert_eq!(path::delete(&doc, &missing_parent).unwrap(), doc);
    assert_eq!(path::delete(&doc, &Path::<NoFilter>::default()).unwrap(), Value::Null);
}

#[test]
fn test_delete_shifts_vector() {
    let doc = v(json!([1, 2, 3]));
    let path: Path = Path::new(vec![Step::Index(0)]);
    assert_eq!(path::delete(&doc, &path).unwrap(), v(json!([2, 3])));
}

#[test]
fn test_patch_sees_missing_targets() {
    let doc = v(json!({"n": 1}));
    let path = keys(&["n"]);
    let updated = path::patch(&doc, &path, |existing| {
        Ok(match existing {
            Some(Value::Int(n)) => Value::Int(n + 1),
            _ => Value::Int(0),
        })
    })
    .unwrap();
    assert_eq!(updated, v(json!({"n": 2})));

    let created = path::patch(&doc, &keys(&["m"]), |existing| {
        assert!(existing.is_none());
        Ok(Value::Int(0))
    })
    .unwrap();
    assert_eq!(created, v(json!({"m": 0, "n": 1})));
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_filter_visits_in_order() {
    let doc = v(json!({"c": 3, "a": 1, "b": 2}));
    let everything = Everything::default();
    let path = Path::new(vec![Step::Filter(everything)]);
    assert_eq!(path::get(&doc, &path).unwrap(), v(json!([1, 2, 3])));

    let Step::Filter(everything) = &path.steps()[0] else {
        unreachable!()
    };
    assert_eq!(
        *everything.seen.borrow(),
        vec![Key::Name("a".into()), Key::Name("b".into()), Key::Name("c".into())]
    );
}

#[test]
fn test_nested_filters_flatten() {
    let doc = v(json!([[1, 2], [3]]));
    let path = Path::new(vec![
        Step::Filter(Everything::default()),
        Step::Filter(Everything::default()),
    ]);
    assert_eq!(path::get(&doc, &path).unwrap(), v(json!([1, 2, 3])));
}

#[test]
fn test_filter_skips_untraversable_matches() {
    let doc = v(json!([{"a": 1}, "text", {"b": 2}, {"a": 3}]));
    let path = Path::new(vec![Step::Filter(Everything::default()), Step::Key("a".into())]);
    assert_eq!(path::get(&doc, &path).unwrap(), v(json!([1, 3])));

    let updated = path::set(&doc, &path, Value::Int(0)).unwrap();
    assert_eq!(updated, v(json!([{"a": 0}, "text", {"a": 0, "b": 2}, {"a": 0}])));
}

#[test]
fn test_filter_delete() {
    let doc = v(json!([1, 5, 2, 7]));
    let path = Path::new(vec![Step::Filter(Above(3))]);
    assert_eq!(path::delete(&doc, &path).unwrap(), v(json!([1, 2])));
}

// ============================================================================
// Host values
// ============================================================================

#[test]
fn test_host_get_and_set() {
    let doc = record();
    assert_eq!(path::get(&doc, &keys(&["name"])).unwrap(), Value::from("Ada"));

    let updated = path::set(&doc, &keys(&["name"]), Value::from("Grace")).unwrap();
    assert_eq!(path::get(&updated, &keys(&["name"])).unwrap(), Value::from("Grace"));
    assert_eq!(path::get(&doc, &keys(&["name"])).unwrap(), Value::from("Ada"));

    let deleted = path::delete(&updated, &keys(&["age"])).unwrap();
    assert!(path::get(&deleted, &keys(&["age"])).is_err());
}

#[test]
fn test_read_only_host() {
    let doc = Value::Host(Host::new(Frozen(vec![1, 5, 9])));
    let first: Path = Path::new(vec![Step::Index(0)]);
    assert_eq!(path::get(&doc, &first).unwrap(), Value::Int(1));
    assert!(matches!(
        path::set(&doc, &first, Value::Int(0)),
        Err(PathError::InvalidStep(_))
    ));

    let large = Path::new(vec![Step::Filter(Above(3))]);
    assert_eq!(path::get(&doc, &large).unwrap(), v(json!([5, 9])));
}

#[test]
fn test_host_inside_scripts() {
    let mut map = quill_lang::Map::new();
    map.insert("person".into(), record());
    let doc = Value::Object(map);

    let program = parse(
        "host",
        "(set! .person.name (concat \" \" .person.name \"Lovelace\")) [(type-of .person) .person.name]",
    )
    .unwrap();
    let (doc, value) = program
        .run(&CancellationToken::new(), doc, Variables::new(), builtins::all(), Arc::new(Strict))
        .unwrap();

    assert_eq!(value, v(json!(["record", "Ada Lovelace"])));
    assert_eq!(
        quill_lang::to_json(&doc),
        r#"{"person":{"age":36,"name":"Ada Lovelace"}}"#
    );
}
