//! Generic path engine.
//!
//! A [`Path`] is an ordered list of [`Step`]s. Singular steps (`Index`, `Key`)
//! select exactly one child; a `Filter` step selects every child its
//! [`Predicate`] keeps.
//!
//! The four operations never mutate their input:
//!
//! - [`get`] reads a value, erroring on missing keys, bad indexes and
//!   non-container traversal
//! - [`set`] / [`patch`] return a copy with the target replaced, creating
//!   missing intermediate containers along the way
//! - [`delete`] returns a copy with the target removed; removing something
//!   that does not exist is a no-op
//!
//! Below a filter step, sub-trees that cannot be traversed are skipped rather
//! than reported, so a filter behaves like "collect all matches".
//!
//! # Examples
//!
//! ```
//! use quill_lang::path::{self, Path, Step};
//! use quill_lang::Value;
//!
//! let path: Path = Path::new(vec![Step::Key("foo".into())]);
//! let updated = path::set(&Value::Null, &path, Value::from("bar")).unwrap();
//! assert_eq!(path::get(&updated, &path).unwrap(), Value::from("bar"));
//! ```

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::host::Host;
use crate::value::{Map, Value};

/// Errors raised while walking a path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("no such key `{0}`")]
    NoSuchKey(String),

    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    /// The step kind does not fit the container (e.g. a key on a vector).
    #[error("invalid step: {0}")]
    InvalidStep(String),

    /// The value is not a container at all.
    #[error("cannot traverse into {type_name} with {step}")]
    Untraversable { type_name: String, step: String },
}

impl PathError {
    /// Missing keys and bad indexes describe absence rather than misuse.
    pub fn is_soft(&self) -> bool {
        matches!(self, PathError::NoSuchKey(_) | PathError::IndexOutOfBounds { .. })
    }
}

/// Position of an element inside its container, as seen by a filter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    pub fn to_value(&self) -> Value {
        match self {
            Key::Index(i) => Value::Int(i64::try_from(*i).unwrap_or(i64::MAX)),
            Key::Name(name) => Value::String(name.clone()),
        }
    }
}

/// Decides which elements a filter step keeps.
pub trait Predicate {
    type Error: From<PathError>;

    fn keep(&self, key: &Key, value: &Value) -> Result<bool, Self::Error>;
}

/// Predicate type for paths that contain no filter steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoFilter {}

impl Predicate for NoFilter {
    type Error = PathError;

    fn keep(&self, _key: &Key, _value: &Value) -> Result<bool, PathError> {
        match *self {}
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step<P = NoFilter> {
    Index(i64),
    Key(String),
    Filter(P),
}

impl<P> fmt::Display for Step<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Index(i) => write!(f, "index [{i}]"),
            Step::Key(k) => write!(f, "key `{k}`"),
            Step::Filter(_) => f.write_str("filter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path<P = NoFilter> {
    steps: Vec<Step<P>>,
}

impl<P> Path<P> {
    pub fn new(steps: Vec<Step<P>>) -> Self {
        Path { steps }
    }

    pub fn steps(&self) -> &[Step<P>] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn has_filters(&self) -> bool {
        self.steps.iter().any(|s| matches!(s, Step::Filter(_)))
    }
}

impl<P> Default for Path<P> {
    fn default() -> Self {
        Path { steps: Vec::new() }
    }
}

impl<P> FromIterator<Step<P>> for Path<P> {
    fn from_iter<I: IntoIterator<Item = Step<P>>>(iter: I) -> Self {
        Path::new(iter.into_iter().collect())
    }
}

/// Internal failure: path errors can be skipped below filters, errors raised
/// by predicates and patchers always propagate.
enum Fail<E> {
    Path(PathError),
    Other(E),
}

impl<E> From<PathError> for Fail<E> {
    fn from(e: PathError) -> Self {
        Fail::Path(e)
    }
}

impl<E: From<PathError>> Fail<E> {
    fn into_error(self) -> E {
        match self {
            Fail::Path(e) => E::from(e),
            Fail::Other(e) => e,
        }
    }
}

fn untraversable<P>(value: &Value, step: &Step<P>) -> PathError {
    untraversable_host(value.type_name(), step)
}

fn untraversable_host<P>(type_name: &str, step: &Step<P>) -> PathError {
    PathError::Untraversable {
        type_name: type_name.to_string(),
        step: step.to_string(),
    }
}

fn wrong_step<P>(value: &Value, step: &Step<P>) -> PathError {
    PathError::InvalidStep(format!("cannot use {step} on {}", value.type_name()))
}

fn checked_index(index: i64, len: usize) -> Result<usize, PathError> {
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(i),
        _ => Err(PathError::IndexOutOfBounds { index, len }),
    }
}

/// Resolves a singular step against a container.
fn child<'v, P>(value: &'v Value, step: &Step<P>) -> Result<Cow<'v, Value>, PathError> {
    match (value, step) {
        (Value::Vector(items), Step::Index(index)) => {
            let i = checked_index(*index, items.len())?;
            Ok(Cow::Borrowed(&items[i]))
        }
        (Value::Object(map), Step::Key(key)) => map
            .get(key)
            .map(Cow::Borrowed)
            .ok_or_else(|| PathError::NoSuchKey(key.clone())),
        (Value::Host(host), Step::Key(key)) => {
            let reader = host.object_reader().ok_or_else(|| untraversable(value, step))?;
            reader.get_object_key(key).map(Cow::Owned)
        }
        (Value::Host(host), Step::Index(index)) => {
            let reader = host.vector_reader().ok_or_else(|| untraversable(value, step))?;
            let i = checked_index(*index, reader.vector_len())?;
            reader.get_vector_item(i).map(Cow::Owned)
        }
        (Value::Vector(_), _) | (Value::Object(_), _) => Err(wrong_step(value, step)),
        _ => Err(untraversable(value, step)),
    }
}

/// Children of a container in iteration order: vectors by index, objects by
/// key (lexicographic).
fn entries(value: &Value) -> Result<Option<Vec<(Key, Cow<'_, Value>)>>, PathError> {
    match value {
        Value::Vector(items) => Ok(Some(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (Key::Index(i), Cow::Borrowed(v)))
                .collect(),
        )),
        Value::Object(map) => Ok(Some(
            map.iter()
                .map(|(k, v)| (Key::Name(k.clone()), Cow::Borrowed(v)))
                .collect(),
        )),
        Value::Host(host) => {
            if let Some(reader) = host.vector_reader() {
                let mut out = Vec::with_capacity(reader.vector_len());
                for i in 0..reader.vector_len() {
                    out.push((Key::Index(i), Cow::Owned(reader.get_vector_item(i)?)));
                }
                Ok(Some(out))
            } else if let Some(reader) = host.object_reader() {
                let mut keys = reader.object_keys();
                keys.sort();
                let mut out = Vec::with_capacity(keys.len());
                for key in keys {
                    let item = reader.get_object_key(&key)?;
                    out.push((Key::Name(key), Cow::Owned(item)));
                }
                Ok(Some(out))
            } else {
                Ok(None)
            }
        }
        _ => Ok(None),
    }
}

/// Reads the value at `path`.
///
/// A path with filter steps yields a vector of all matches; matches of
/// nested filters are flattened into that one vector.
pub fn get<P: Predicate>(value: &Value, path: &Path<P>) -> Result<Value, P::Error> {
    match get_steps(value, &path.steps, false) {
        Ok(found) => Ok(found.unwrap_or(Value::Null)),
        Err(fail) => Err(fail.into_error()),
    }
}

fn get_steps<P: Predicate>(
    value: &Value,
    steps: &[Step<P>],
    below_filter: bool,
) -> Result<Option<Value>, Fail<P::Error>> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(Some(value.clone()));
    };

    let Step::Filter(predicate) = step else {
        return match child(value, step) {
            Ok(next) => get_steps(&next, rest, below_filter),
            Err(_) if below_filter => Ok(None),
            Err(e) => Err(Fail::Path(e)),
        };
    };

    let candidates = match entries(value) {
        Ok(Some(candidates)) => candidates,
        Ok(None) if below_filter || value.is_null() => return Ok(None),
        Ok(None) => return Err(Fail::Path(untraversable(value, step))),
        Err(_) if below_filter => return Ok(None),
        Err(e) => return Err(Fail::Path(e)),
    };

    let nested = rest.iter().any(|s| matches!(s, Step::Filter(_)));
    let mut matches = Vec::new();
    for (key, item) in candidates {
        if !predicate.keep(&key, &item).map_err(Fail::Other)? {
            continue;
        }
        match get_steps(&item, rest, true)? {
            Some(Value::Vector(inner)) if nested => matches.extend(inner),
            Some(found) => matches.push(found),
            None => {}
        }
    }
    Ok(Some(Value::Vector(matches)))
}

/// Returns a copy of `value` with the target of `path` replaced by `new_value`.
pub fn set<P: Predicate>(value: &Value, path: &Path<P>, new_value: Value) -> Result<Value, P::Error> {
    patch(value, path, |_| Ok(new_value.clone()))
}

/// Returns a copy of `value` where the target of `path` is replaced by what
/// `patcher` computes from it. The patcher sees `None` for targets that do
/// not exist yet and runs once per match of a filter step.
pub fn patch<P, F>(value: &Value, path: &Path<P>, mut patcher: F) -> Result<Value, P::Error>
where
    P: Predicate,
    F: FnMut(Option<&Value>) -> Result<Value, P::Error>,
{
    let mut out = value.clone();
    patch_in_place(&mut out, &path.steps, Slot::Root, &mut patcher).map_err(Fail::into_error)?;
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// The value handed to `set`/`patch` itself.
    Root,
    Existing,
    Missing,
}

fn patch_in_place<P, F>(
    slot: &mut Value,
    steps: &[Step<P>],
    state: Slot,
    patcher: &mut F,
) -> Result<(), Fail<P::Error>>
where
    P: Predicate,
    F: FnMut(Option<&Value>) -> Result<Value, P::Error>,
{
    let Some((step, rest)) = steps.split_first() else {
        let existing = (state != Slot::Missing).then_some(&*slot);
        let replacement = patcher(existing).map_err(Fail::Other)?;
        *slot = replacement;
        return Ok(());
    };

    match step {
        Step::Key(key) => {
            if slot.is_null() {
                tracing::trace!(key = key.as_str(), "vivifying object");
                *slot = Value::Object(Map::new());
            }
            match slot {
                Value::Object(map) => {
                    let state = if map.contains_key(key) { Slot::Existing } else { Slot::Missing };
                    let child = map.entry(key.clone()).or_insert(Value::Null);
                    patch_in_place(child, rest, state, patcher)
                }
                Value::Host(host) => {
                    let reader = host.object_reader().ok_or_else(|| untraversable_host(host.type_name(), step))?;
                    let (mut child, state) = match reader.get_object_key(key) {
                        Ok(v) => (v, Slot::Existing),
                        Err(PathError::NoSuchKey(_)) => (Value::Null, Slot::Missing),
                        Err(e) => return Err(Fail::Path(e)),
                    };
                    patch_in_place(&mut child, rest, state, patcher)?;
                    let type_name = host.type_name().to_string();
                    let writer = host.inner_mut().object_writer().ok_or_else(|| {
                        PathError::InvalidStep(format!("{type_name} is read-only"))
                    })?;
                    writer.set_object_key(key, child).map_err(Fail::Path)
                }
                Value::Vector(_) => Err(Fail::Path(wrong_step(slot, step))),
                other => Err(Fail::Path(untraversable(other, step))),
            }
        }
        Step::Index(index) => {
            if slot.is_null() {
                if state == Slot::Root {
                    return Err(Fail::Path(untraversable(slot, step)));
                }
                tracing::trace!(index = *index, "vivifying vector");
                *slot = Value::Vector(Vec::new());
            }
            match slot {
                Value::Vector(items) => {
                    let len = items.len();
                    let i = usize::try_from(*index)
                        .map_err(|_| PathError::IndexOutOfBounds { index: *index, len })?;
                    let state = if i < len { Slot::Existing } else { Slot::Missing };
                    if i >= len {
                        items
                            .try_reserve(i - len + 1)
                            .map_err(|_| PathError::IndexOutOfBounds { index: *index, len })?;
                        items.resize(i + 1, Value::Null);
                    }
                    patch_in_place(&mut items[i], rest, state, patcher)
                }
                Value::Host(host) => {
                    let reader = host.vector_reader().ok_or_else(|| untraversable_host(host.type_name(), step))?;
                    let len = reader.vector_len();
                    let i = usize::try_from(*index)
                        .map_err(|_| PathError::IndexOutOfBounds { index: *index, len })?;
                    let (mut child, state) = if i < len {
                        (reader.get_vector_item(i)?, Slot::Existing)
                    } else {
                        (Value::Null, Slot::Missing)
                    };
                    patch_in_place(&mut child, rest, state, patcher)?;
                    let type_name = host.type_name().to_string();
                    let writer = host.inner_mut().vector_writer().ok_or_else(|| {
                        PathError::InvalidStep(format!("{type_name} is read-only"))
                    })?;
                    writer.set_vector_item(i, child).map_err(Fail::Path)
                }
                Value::Object(_) => Err(Fail::Path(wrong_step(slot, step))),
                other => Err(Fail::Path(untraversable(other, step))),
            }
        }
        Step::Filter(predicate) => match slot {
            Value::Vector(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    if predicate.keep(&Key::Index(i), item).map_err(Fail::Other)? {
                        patch_match(item, rest, patcher)?;
                    }
                }
                Ok(())
            }
            Value::Object(map) => {
                for (key, item) in map.iter_mut() {
                    if predicate.keep(&Key::Name(key.clone()), item).map_err(Fail::Other)? {
                        patch_match(item, rest, patcher)?;
                    }
                }
                Ok(())
            }
            Value::Host(_) => {
                let Some(candidates) = entries(slot)? else {
                    return Ok(());
                };
                let mut updates = Vec::new();
                for (key, item) in candidates {
                    if predicate.keep(&key, &item).map_err(Fail::Other)? {
                        let mut item = item.into_owned();
                        patch_match(&mut item, rest, patcher)?;
                        updates.push((key, item));
                    }
                }
                write_host_entries(slot, updates)
            }
            // filters skip anything they cannot iterate
            _ => Ok(()),
        },
    }
}

/// Patches one filter match. Path errors inside the match leave it untouched.
fn patch_match<P, F>(item: &mut Value, rest: &[Step<P>], patcher: &mut F) -> Result<(), Fail<P::Error>>
where
    P: Predicate,
    F: FnMut(Option<&Value>) -> Result<Value, P::Error>,
{
    let mut copy = item.clone();
    match patch_in_place(&mut copy, rest, Slot::Existing, patcher) {
        Ok(()) => {
            *item = copy;
            Ok(())
        }
        Err(Fail::Path(e)) => {
            tracing::trace!(error = %e, "skipping filter match");
            Ok(())
        }
        Err(other) => Err(other),
    }
}

fn write_host_entries<E>(slot: &mut Value, updates: Vec<(Key, Value)>) -> Result<(), Fail<E>> {
    let Value::Host(host) = slot else {
        return Ok(());
    };
    let type_name = host.type_name().to_string();
    for (key, item) in updates {
        match key {
            Key::Index(i) => host
                .inner_mut()
                .vector_writer()
                .ok_or_else(|| PathError::InvalidStep(format!("{type_name} is read-only")))?
                .set_vector_item(i, item)?,
            Key::Name(name) => host
                .inner_mut()
                .object_writer()
                .ok_or_else(|| PathError::InvalidStep(format!("{type_name} is read-only")))?
                .set_object_key(&name, item)?,
        }
    }
    Ok(())
}

/// Returns a copy of `value` with the target of `path` removed.
///
/// Vector elements after a removed index shift down. Deleting the empty path
/// yields null.
pub fn delete<P: Predicate>(value: &Value, path: &Path<P>) -> Result<Value, P::Error> {
    if path.is_empty() {
        return Ok(Value::Null);
    }
    let mut out = value.clone();
    delete_in_place(&mut out, &path.steps).map_err(Fail::into_error)?;
    Ok(out)
}

fn delete_in_place<P: Predicate>(slot: &mut Value, steps: &[Step<P>]) -> Result<(), Fail<P::Error>> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(());
    };
    let terminal = rest.is_empty();

    match (&mut *slot, step) {
        // nothing below null to delete
        (Value::Null, _) => Ok(()),

        (Value::Object(map), Step::Key(key)) => {
            if terminal {
                map.remove(key);
                Ok(())
            } else if let Some(child) = map.get_mut(key) {
                delete_in_place(child, rest)
            } else {
                Ok(())
            }
        }

        (Value::Vector(items), Step::Index(index)) => {
            let Ok(i) = checked_index(*index, items.len()) else {
                return Ok(());
            };
            if terminal {
                items.remove(i);
                Ok(())
            } else {
                delete_in_place(&mut items[i], rest)
            }
        }

        (Value::Host(_), Step::Key(_) | Step::Index(_)) => delete_in_host(slot, step, rest),

        (Value::Vector(items), Step::Filter(predicate)) => {
            if terminal {
                let mut doomed = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    doomed.push(predicate.keep(&Key::Index(i), item).map_err(Fail::Other)?);
                }
                let mut flags = doomed.into_iter();
                items.retain(|_| !flags.next().unwrap_or(false));
            } else {
                for (i, item) in items.iter_mut().enumerate() {
                    if predicate.keep(&Key::Index(i), item).map_err(Fail::Other)? {
                        delete_match(item, rest)?;
                    }
                }
            }
            Ok(())
        }

        (Value::Object(map), Step::Filter(predicate)) => {
            if terminal {
                let mut doomed = Vec::new();
                for (key, item) in map.iter() {
                    if predicate.keep(&Key::Name(key.clone()), item).map_err(Fail::Other)? {
                        doomed.push(key.clone());
                    }
                }
                for key in doomed {
                    map.remove(&key);
                }
            } else {
                for (key, item) in map.iter_mut() {
                    if predicate.keep(&Key::Name(key.clone()), item).map_err(Fail::Other)? {
                        delete_match(item, rest)?;
                    }
                }
            }
            Ok(())
        }

        (Value::Host(_), Step::Filter(predicate)) => {
            let Some(candidates) = entries(slot)? else {
                return Ok(());
            };
            let mut matched = Vec::new();
            for (key, item) in candidates {
                if predicate.keep(&key, &item).map_err(Fail::Other)? {
                    matched.push((key, item.into_owned()));
                }
            }
            let Value::Host(host) = slot else {
                return Ok(());
            };
            if terminal {
                // remove from the back so earlier indexes stay valid
                for (key, _) in matched.into_iter().rev() {
                    remove_host_entry(host, &key)?;
                }
                Ok(())
            } else {
                let mut updates = Vec::new();
                for (key, mut item) in matched {
                    delete_match(&mut item, rest)?;
                    updates.push((key, item));
                }
                write_host_entries(slot, updates)
            }
        }

        // filters skip anything they cannot iterate
        (_, Step::Filter(_)) => Ok(()),

        (Value::Vector(_) | Value::Object(_), _) => Err(Fail::Path(wrong_step(slot, step))),
        (other, _) => Err(Fail::Path(untraversable(other, step))),
    }
}

fn delete_match<P: Predicate>(item: &mut Value, rest: &[Step<P>]) -> Result<(), Fail<P::Error>> {
    let mut copy = item.clone();
    match delete_in_place(&mut copy, rest) {
        Ok(()) => {
            *item = copy;
            Ok(())
        }
        Err(Fail::Path(e)) => {
            tracing::trace!(error = %e, "skipping filter match");
            Ok(())
        }
        Err(other) => Err(other),
    }
}

fn remove_host_entry(host: &mut Host, key: &Key) -> Result<(), PathError> {
    let type_name = host.type_name().to_string();
    let read_only = || PathError::InvalidStep(format!("{type_name} is read-only"));
    let result = match key {
        Key::Index(i) => host.inner_mut().vector_writer().ok_or_else(read_only)?.remove_vector_item(*i),
        Key::Name(name) => host.inner_mut().object_writer().ok_or_else(read_only)?.delete_object_key(name),
    };
    match result {
        Err(e) if e.is_soft() => Ok(()),
        other => other,
    }
}

fn delete_in_host<P: Predicate>(slot: &mut Value, step: &Step<P>, rest: &[Step<P>]) -> Result<(), Fail<P::Error>> {
    let Value::Host(host) = slot else {
        return Ok(());
    };
    let key = match step {
        Step::Index(index) => {
            let Some(reader) = host.vector_reader() else {
                return Err(Fail::Path(untraversable_host(host.type_name(), step)));
            };
            match checked_index(*index, reader.vector_len()) {
                Ok(i) => Key::Index(i),
                Err(_) => return Ok(()),
            }
        }
        Step::Key(name) => {
            if host.object_reader().is_none() {
                return Err(Fail::Path(untraversable_host(host.type_name(), step)));
            }
            Key::Name(name.clone())
        }
        Step::Filter(_) => return Ok(()),
    };

    if rest.is_empty() {
        return remove_host_entry(host, &key).map_err(Fail::Path);
    }

    let existing = match &key {
        Key::Index(i) => host.vector_reader().map(|r| r.get_vector_item(*i)),
        Key::Name(name) => host.object_reader().map(|r| r.get_object_key(name)),
    };
    let mut child = match existing {
        Some(Ok(child)) => child,
        Some(Err(e)) if e.is_soft() => return Ok(()),
        Some(Err(e)) => return Err(Fail::Path(e)),
        None => return Ok(()),
    };
    delete_in_place(&mut child, rest)?;
    write_host_entries(slot, vec![(key, child)])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Keeps objects whose field equals a value.
    struct FieldEquals(&'static str, Value);

    impl Predicate for FieldEquals {
        type Error = PathError;

        fn keep(&self, _key: &Key, value: &Value) -> Result<bool, PathError> {
            Ok(matches!(value, Value::Object(map) if map.get(self.0) == Some(&self.1)))
        }
    }

    fn key(k: &str) -> Step {
        Step::Key(k.to_string())
    }

    fn json(s: &str) -> Value {
        Value::from(serde_json::from_str::<serde_json::Value>(s).unwrap())
    }

    #[test]
    fn test_get_empty_path_returns_whole_value() {
        let doc = json(r#"{"a": 1}"#);
        assert_eq!(get(&doc, &Path::<NoFilter>::default()).unwrap(), doc);
    }

    #[test]
    fn test_get_errors() {
        let doc = json(r#"{"a": [1, 2], "s": "x"}"#);
        assert_eq!(
            get(&doc, &Path::new(vec![key("missing")])),
            Err(PathError::NoSuchKey("missing".into()))
        );
        assert_eq!(
            get(&doc, &Path::new(vec![key("a"), Step::Index(2)])),
            Err(PathError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(
            get(&doc, &Path::new(vec![key("a"), Step::Index(-1)])),
            Err(PathError::IndexOutOfBounds { index: -1, len: 2 })
        );
        assert!(matches!(
            get(&doc, &Path::new(vec![key("s"), key("x")])),
            Err(PathError::Untraversable { .. })
        ));
    }

    #[test]
    fn test_set_vivifies_object_from_null() {
        let out = set(&Value::Null, &Path::new(vec![key("foo")]), Value::from("bar")).unwrap();
        assert_eq!(out, json(r#"{"foo": "bar"}"#));
    }

    #[test]
    fn test_set_refuses_to_index_root_null() {
        let result = set(&Value::Null, &Path::new(vec![Step::<NoFilter>::Index(0)]), Value::from("bar"));
        assert!(matches!(result, Err(PathError::Untraversable { .. })));
    }

    #[test]
    fn test_set_vivifies_nested_vector() {
        let out = set(&Value::Null, &Path::new(vec![key("a"), Step::Index(2)]), Value::Int(1)).unwrap();
        assert_eq!(out, json(r#"{"a": [null, null, 1]}"#));
    }

    #[test]
    fn test_set_grows_vector_with_nulls() {
        let out = set(&json("[1]"), &Path::new(vec![Step::<NoFilter>::Index(3)]), Value::Int(4)).unwrap();
        assert_eq!(out, json("[1, null, null, 4]"));
    }

    #[test]
    fn test_set_never_changes_scalar_kind() {
        let doc = json(r#"{"a": 5}"#);
        assert!(set(&doc, &Path::new(vec![key("a"), key("b")]), Value::Null).is_err());
        assert!(set(&doc, &Path::new(vec![key("a"), Step::Index(0)]), Value::Null).is_err());
    }

    #[test]
    fn test_set_does_not_touch_input() {
        let doc = json(r#"{"a": {"b": 1}}"#);
        let out = set(&doc, &Path::new(vec![key("a"), key("b")]), Value::Int(2)).unwrap();
        assert_eq!(doc, json(r#"{"a": {"b": 1}}"#));
        assert_eq!(out, json(r#"{"a": {"b": 2}}"#));
    }

    #[test]
    fn test_round_trip_set_then_get() {
        let doc = json(r#"{"a": [{"b": 1}, {"b": 2}]}"#);
        let path = Path::new(vec![key("a"), Step::Index(1), key("b")]);
        for x in [Value::Null, Value::Int(9), json(r#"{"deep": [1]}"#)] {
            let out = set(&doc, &path, x.clone()).unwrap();
            assert_eq!(get(&out, &path).unwrap(), x);
        }
    }

    #[test]
    fn test_patch_sees_missing_target_as_none() {
        let mut seen = Vec::new();
        let out = patch(&json("{}"), &Path::new(vec![key("n")]), |existing| {
            seen.push(existing.cloned());
            Ok(Value::Int(1))
        })
        .unwrap();
        assert_eq!(seen, vec![None]);
        assert_eq!(out, json(r#"{"n": 1}"#));
    }

    #[test]
    fn test_delete_shifts_vector_and_is_idempotent() {
        let doc = json(r#"{"a": [1, 2, 3]}"#);
        let path = Path::new(vec![key("a"), Step::Index(0)]);
        let once = delete(&doc, &path).unwrap();
        assert_eq!(once, json(r#"{"a": [2, 3]}"#));

        let missing = Path::new(vec![key("b"), key("c")]);
        let gone = delete(&doc, &missing).unwrap();
        assert_eq!(gone, doc);
        assert_eq!(delete(&gone, &missing).unwrap(), gone);
    }

    #[test]
    fn test_delete_rejects_invalid_step_type() {
        let doc = json(r#"{"a": 5}"#);
        assert!(delete(&doc, &Path::new(vec![key("a"), key("b")])).is_err());
        assert!(delete(&json("[1]"), &Path::new(vec![key("x")])).is_err());
    }

    #[test]
    fn test_filter_get_and_patch() {
        let doc = json(r#"[{"a": 1, "b": [1, 2]}, {"a": 1, "b": [3, 4]}, {"a": 2}]"#);
        let path = Path::new(vec![Step::Filter(FieldEquals("a", Value::Int(1))), Step::Key("b".into())]);

        assert_eq!(get(&doc, &path).unwrap(), json("[[1, 2], [3, 4]]"));

        let out = patch(&doc, &path, |existing| {
            let mut items = match existing {
                Some(Value::Vector(items)) => items.clone(),
                _ => Vec::new(),
            };
            items.push(Value::Int(42));
            Ok(Value::Vector(items))
        })
        .unwrap();
        assert_eq!(
            out,
            json(r#"[{"a": 1, "b": [1, 2, 42]}, {"a": 1, "b": [3, 4, 42]}, {"a": 2}]"#)
        );
    }

    #[test]
    fn test_filter_skips_untraversable_matches() {
        let doc = json(r#"[{"a": 1, "b": {"c": 1}}, {"a": 1, "b": 7}]"#);
        let path = Path::new(vec![Step::Filter(FieldEquals("a", Value::Int(1))), Step::Key("b".into()), Step::Key("c".into())]);
        assert_eq!(get(&doc, &path).unwrap(), json("[1]"));

        let out = set(&doc, &path, Value::Int(2)).unwrap();
        assert_eq!(out, json(r#"[{"a": 1, "b": {"c": 2}}, {"a": 1, "b": 7}]"#));
    }

    #[test]
    fn test_filter_delete_removes_matches() {
        let doc = json(r#"{"x": {"a": 1}, "y": {"a": 2}, "z": {"a": 1}}"#);
        let path = Path::new(vec![Step::Filter(FieldEquals("a", Value::Int(1)))]);
        assert_eq!(delete(&doc, &path).unwrap(), json(r#"{"y": {"a": 2}}"#));
    }
}
