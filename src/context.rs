//! Type-indexed property bag threaded through every task invocation.
//!
//! `Context` is cloned wholesale into each task at schedule time; later
//! mutations to the originating [`crate::store::Store`]'s context never
//! reach work already in flight. Internally it maps `TypeId -> Arc<dyn Any>`
//! the same way a dependency-injection container would, keyed by
//! zero-sized [`ContextKey`] marker types rather than strings so lookups
//! are resolved at compile time and a typo can't silently miss.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A typed slot in a [`Context`].
///
/// Implementors are usually zero-sized marker types; `Value` is what gets
/// stored and retrieved, and `default_value` is returned when the key has
/// never been set.
pub trait ContextKey: 'static {
    type Value: Clone + Send + Sync + 'static;

    fn default_value() -> Self::Value;
}

#[derive(Clone, Default)]
pub struct Context {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<K: ContextKey>(&self) -> K::Value {
        self.values
            .get(&TypeId::of::<K>())
            .and_then(|v| v.downcast_ref::<K::Value>())
            .cloned()
            .unwrap_or_else(K::default_value)
    }

    pub fn set<K: ContextKey>(&mut self, value: K::Value) -> &mut Self {
        self.values.insert(TypeId::of::<K>(), Arc::new(value));
        self
    }

    pub fn with<K: ContextKey>(mut self, value: K::Value) -> Self {
        self.set::<K>(value);
        self
    }

    pub fn contains<K: ContextKey>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<K>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("entries", &self.values.len())
            .finish()
    }
}
