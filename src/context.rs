//! The execution environment a script runs in.
//!
//! A [`Context`] is a cheap, immutable value. Every `with_*` method returns a
//! new context that shares the same [`Document`] cell but carries its own
//! variables, functions and coalescer. Variable changes are therefore scoped
//! to the context they were made in (and contexts derived from it), while
//! document writes are visible to every context of the run.

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::coalescing::{Coalescer, Strict};
use crate::evaluator::EvalError;
use crate::functions::Function;
use crate::value::Value;

/// Shared, mutable root value of a run.
#[derive(Debug, Clone)]
pub struct Document(Rc<RefCell<Value>>);

impl Document {
    pub fn new(value: Value) -> Self {
        Document(Rc::new(RefCell::new(value)))
    }

    /// Borrows the current root.
    pub fn borrow(&self) -> Ref<'_, Value> {
        self.0.borrow()
    }

    /// A copy of the current root.
    pub fn snapshot(&self) -> Value {
        self.0.borrow().clone()
    }

    pub fn replace(&self, value: Value) -> Value {
        self.0.replace(value)
    }

    /// Whether both handles point at the same cell.
    pub fn same_as(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new(Value::Null)
    }
}

/// Variable bindings, stored in a persistent map so deriving a scope with
/// one more binding shares the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables(im::HashMap<String, Value>);

impl Variables {
    pub fn new() -> Self {
        Variables::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns a copy with `name` bound to `value`.
    pub fn with(&self, name: impl Into<String>, value: Value) -> Self {
        Variables(self.0.update(name.into(), value))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Variables(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Function table. Host-registered (fixed) functions shadow user-defined
/// ones of the same name.
#[derive(Clone, Default)]
pub struct Functions {
    fixed: Arc<BTreeMap<String, Arc<Function>>>,
    user: im::HashMap<String, Arc<Function>>,
}

impl Functions {
    pub fn new() -> Self {
        Functions::default()
    }

    /// Registers a host function under its own name.
    pub fn register(&mut self, function: Function) {
        Arc::make_mut(&mut self.fixed).insert(function.name().to_string(), Arc::new(function));
    }

    /// Returns a copy with a user-defined function added.
    pub fn define(&self, function: Function) -> Self {
        Functions {
            fixed: Arc::clone(&self.fixed),
            user: self.user.update(function.name().to_string(), Arc::new(function)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Function>> {
        self.fixed
            .get(name)
            .or_else(|| self.user.get(name))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fixed.contains_key(name) || self.user.contains_key(name)
    }

    /// Host-registered functions in name order.
    pub fn fixed(&self) -> impl Iterator<Item = &Arc<Function>> {
        self.fixed.values()
    }

    /// Names of user-defined functions, sorted.
    pub fn user_names(&self) -> Vec<&String> {
        let mut names: Vec<_> = self.user.keys().collect();
        names.sort();
        names
    }
}

impl FromIterator<Function> for Functions {
    fn from_iter<I: IntoIterator<Item = Function>>(iter: I) -> Self {
        let mut functions = Functions::new();
        for function in iter {
            functions.register(function);
        }
        functions
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Functions")
            .field("fixed", &self.fixed.keys().collect::<Vec<_>>())
            .field("user", &self.user_names())
            .finish()
    }
}

/// Cooperative cancellation flag, checked before every function call.
///
/// Clones share the flag, so a host thread can cancel a run in progress.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct Context {
    document: Document,
    variables: Variables,
    functions: Functions,
    coalescer: Arc<dyn Coalescer>,
    cancellation: CancellationToken,
}

impl Context {
    /// A context over `document` with no variables, no functions and
    /// strict coalescing.
    pub fn new(document: Value) -> Self {
        Context {
            document: Document::new(document),
            variables: Variables::new(),
            functions: Functions::new(),
            coalescer: Arc::new(Strict),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn functions(&self) -> &Functions {
        &self.functions
    }

    pub fn coalescer(&self) -> &dyn Coalescer {
        self.coalescer.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn with_document(&self, document: Document) -> Self {
        Context { document, ..self.clone() }
    }

    pub fn with_variable(&self, name: impl Into<String>, value: Value) -> Self {
        Context { variables: self.variables.with(name, value), ..self.clone() }
    }

    pub fn with_variables(&self, variables: Variables) -> Self {
        Context { variables, ..self.clone() }
    }

    pub fn with_functions(&self, functions: Functions) -> Self {
        Context { functions, ..self.clone() }
    }

    /// Adds a user-defined function.
    pub fn with_function(&self, function: Function) -> Self {
        Context { functions: self.functions.define(function), ..self.clone() }
    }

    pub fn with_coalescer(&self, coalescer: Arc<dyn Coalescer>) -> Self {
        Context { coalescer, ..self.clone() }
    }

    pub fn with_cancellation(&self, cancellation: CancellationToken) -> Self {
        Context { cancellation, ..self.clone() }
    }

    pub fn check_cancelled(&self) -> Result<(), EvalError> {
        if self.cancellation.is_cancelled() {
            tracing::debug!("evaluation cancelled");
            return Err(EvalError::Cancelled);
        }
        Ok(())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("document", &self.document)
            .field("variables", &self.variables)
            .field("functions", &self.functions)
            .field("coalescer", &self.coalescer.name())
            .finish()
    }
}
