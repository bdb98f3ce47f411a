//! Opaque host values and the capabilities the path engine uses on them.
//!
//! An embedding application can place its own data inside a document by
//! wrapping it in a [`Host`]. The path engine never looks inside a host
//! value directly; it asks for one of four capabilities:
//!
//! - [`ObjectReader`] / [`ObjectWriter`] for keyed access
//! - [`VectorReader`] / [`VectorWriter`] for indexed access
//!
//! A type implementing only a reader is read-only to scripts; implementing the
//! matching writer as well makes `set!`, `patch!` and `delete!` work on it.

use std::fmt;

use crate::path::PathError;
use crate::value::Value;

/// Keyed read access.
pub trait ObjectReader {
    /// Returns the value stored under `key`, or `PathError::NoSuchKey`.
    fn get_object_key(&self, key: &str) -> Result<Value, PathError>;

    /// All keys, used when a filter step iterates over the object.
    fn object_keys(&self) -> Vec<String>;
}

/// Keyed write access.
pub trait ObjectWriter {
    fn set_object_key(&mut self, key: &str, value: Value) -> Result<(), PathError>;

    fn delete_object_key(&mut self, key: &str) -> Result<(), PathError> {
        Err(PathError::InvalidStep(format!("cannot delete key `{key}` from host object")))
    }
}

/// Indexed read access.
pub trait VectorReader {
    /// Returns the item at `index`, or `PathError::IndexOutOfBounds`.
    fn get_vector_item(&self, index: usize) -> Result<Value, PathError>;

    fn vector_len(&self) -> usize;
}

/// Indexed write access. Growing the vector is up to the implementation.
pub trait VectorWriter {
    fn set_vector_item(&mut self, index: usize, value: Value) -> Result<(), PathError>;

    fn remove_vector_item(&mut self, index: usize) -> Result<(), PathError> {
        Err(PathError::InvalidStep(format!("cannot remove index {index} from host vector")))
    }
}

/// Data owned by the embedding application.
pub trait HostValue: fmt::Debug + Send + Sync {
    /// Name reported by `type-of` and in error messages.
    fn type_name(&self) -> &str;

    /// Deep copy. Mutations through the path engine always work on a copy.
    fn clone_host(&self) -> Box<dyn HostValue>;

    fn equals(&self, _other: &dyn HostValue) -> bool {
        false
    }

    /// Plain value used when the host value is rendered or serialized.
    fn to_value(&self) -> Option<Value> {
        None
    }

    fn object_reader(&self) -> Option<&dyn ObjectReader> {
        None
    }

    fn object_writer(&mut self) -> Option<&mut dyn ObjectWriter> {
        None
    }

    fn vector_reader(&self) -> Option<&dyn VectorReader> {
        None
    }

    fn vector_writer(&mut self) -> Option<&mut dyn VectorWriter> {
        None
    }
}

/// Owning wrapper that makes a [`HostValue`] usable inside [`Value`].
pub struct Host(Box<dyn HostValue>);

impl Host {
    pub fn new(value: impl HostValue + 'static) -> Self {
        Host(Box::new(value))
    }

    pub fn inner(&self) -> &dyn HostValue {
        self.0.as_ref()
    }

    pub fn inner_mut(&mut self) -> &mut dyn HostValue {
        self.0.as_mut()
    }
}

impl std::ops::Deref for Host {
    type Target = dyn HostValue;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Clone for Host {
    fn clone(&self) -> Self {
        Host(self.0.clone_host())
    }
}

impl PartialEq for Host {
    fn eq(&self, other: &Self) -> bool {
        self.0.equals(other.0.as_ref())
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Host> for Value {
    fn from(host: Host) -> Self {
        Value::Host(host)
    }
}
