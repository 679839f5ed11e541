//! Per-operation stores and the type-erased handle the [`crate::client::Client`]
//! cache uses to hold heterogeneous stores in one map.

pub mod mutation;
pub mod paginated;
pub mod query;

pub use mutation::MutationStore;
pub use paginated::PaginatedStore;
pub use query::QueryStore;

use crate::operation::{Mutation, PaginatedQuery, Query};
use crate::path::Path;
use std::any::Any;
use std::sync::Arc;

/// Type-erased view of a store, for cache bookkeeping (path lookup,
/// subscriber-count-driven eviction) where the concrete `Value`/`Failure`
/// types aren't known to the cache itself.
///
/// `into_any` follows the same pattern as the `downcast-rs` crate: a
/// trait method taking `self: Arc<Self>` dispatches dynamically through the
/// vtable, letting a caller recover the original `Arc<QueryStore<Q>>` (etc.)
/// via [`Arc::downcast`] once it knows which concrete type to ask for.
pub trait ErasedStore: Send + Sync + 'static {
    fn path(&self) -> Path;
    fn subscriber_count(&self) -> usize;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<Q: Query> ErasedStore for QueryStore<Q> {
    fn path(&self) -> Path {
        QueryStore::path(self)
    }

    fn subscriber_count(&self) -> usize {
        QueryStore::subscriber_count(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<P: PaginatedQuery> ErasedStore for PaginatedStore<P> {
    fn path(&self) -> Path {
        PaginatedStore::path(self)
    }

    fn subscriber_count(&self) -> usize {
        PaginatedStore::subscriber_count(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<M: Mutation> ErasedStore for MutationStore<M> {
    fn path(&self) -> Path {
        MutationStore::path(self)
    }

    fn subscriber_count(&self) -> usize {
        MutationStore::subscriber_count(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub fn downcast_query<Q: Query>(erased: Arc<dyn ErasedStore>) -> Option<Arc<QueryStore<Q>>> {
    erased.into_any().downcast::<QueryStore<Q>>().ok()
}

pub fn downcast_paginated<P: PaginatedQuery>(erased: Arc<dyn ErasedStore>) -> Option<Arc<PaginatedStore<P>>> {
    erased.into_any().downcast::<PaginatedStore<P>>().ok()
}

pub fn downcast_mutation<M: Mutation>(erased: Arc<dyn ErasedStore>) -> Option<Arc<MutationStore<M>>> {
    erased.into_any().downcast::<MutationStore<M>>().ok()
}
