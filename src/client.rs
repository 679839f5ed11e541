//! Path-indexed directory of stores. A `Client` is the entry point
//! application code holds onto; stores themselves are created lazily the
//! first time their path is asked for and evicted once nothing subscribes
//! to them, the same "dumb map, smart accessor" shape as the teacher's
//! `InMemoryBackend` sitting underneath its domain-logic layer — except
//! here the map holds live stores instead of serialized bytes.

use crate::error::EngineError;
use crate::modifiers::StoreOptions;
use crate::operation::{Mutation, PaginatedQuery, Query};
use crate::path::Path;
use crate::store::{downcast_mutation, downcast_paginated, downcast_query, ErasedStore, MutationStore, PaginatedStore, QueryStore};
use crate::warning::{default_reporter, WarningReporter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Client {
    default_options: StoreOptions,
    stores: Mutex<HashMap<Path, Arc<dyn ErasedStore>>>,
    max_stores: Option<usize>,
    warning_reporter: Arc<dyn WarningReporter>,
}

impl Client {
    pub fn new(default_options: StoreOptions) -> Arc<Self> {
        Arc::new(Self {
            default_options,
            stores: Mutex::new(HashMap::new()),
            max_stores: None,
            warning_reporter: default_reporter(),
        })
    }

    pub fn with_max_stores(mut self: Arc<Self>, max_stores: usize) -> Arc<Self> {
        Arc::get_mut(&mut self)
            .expect("Client must not yet be shared when configuring max_stores")
            .max_stores = Some(max_stores);
        self
    }

    pub fn store_count(&self) -> usize {
        self.stores.lock().len()
    }

    /// Returns every store whose path satisfies `predicate`, most commonly
    /// used with [`Path::is_prefix_of`] to find every store under a subtree.
    pub fn stores_matching(&self, predicate: impl Fn(&Path) -> bool) -> Vec<Arc<dyn ErasedStore>> {
        self.stores
            .lock()
            .values()
            .filter(|store| predicate(&store.path()))
            .cloned()
            .collect()
    }

    /// Drops every cached store with no active subscribers. Stores with at
    /// least one subscriber are left untouched even if nothing has run
    /// recently — eviction is driven purely by subscriber count, not
    /// staleness.
    pub fn clear_cache(&self) {
        let mut stores = self.stores.lock();
        let before = stores.len();
        stores.retain(|_, store| store.subscriber_count() > 0);
        let evicted = before - stores.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = stores.len(), "evicted unsubscribed stores from cache");
        }
    }

    fn make_room(&self, stores: &mut HashMap<Path, Arc<dyn ErasedStore>>) {
        let Some(max) = self.max_stores else { return };
        if stores.len() < max {
            return;
        }
        let victim = stores
            .iter()
            .find(|(_, store)| store.subscriber_count() == 0)
            .map(|(path, _)| path.clone());
        match victim {
            Some(path) => {
                stores.remove(&path);
            }
            None => self.warning_reporter.report(&EngineError::StoreCapacityExceeded(max)),
        }
    }

    pub fn query_store<Q: Query>(&self, operation: Q) -> Arc<QueryStore<Q>> {
        let path = operation.path();
        let mut stores = self.stores.lock();
        if let Some(existing) = stores.get(&path) {
            if let Some(store) = downcast_query::<Q>(existing.clone()) {
                return store;
            }
        }
        self.make_room(&mut stores);
        let store = QueryStore::new(operation, self.default_options.clone());
        stores.insert(path, store.clone());
        store
    }

    pub fn paginated_store<P: PaginatedQuery>(&self, operation: P) -> Arc<PaginatedStore<P>> {
        let path = operation.path();
        let mut stores = self.stores.lock();
        if let Some(existing) = stores.get(&path) {
            if let Some(store) = downcast_paginated::<P>(existing.clone()) {
                return store;
            }
        }
        self.make_room(&mut stores);
        let store = PaginatedStore::new(operation, self.default_options.clone());
        stores.insert(path, store.clone());
        store
    }

    pub fn mutation_store<M: Mutation>(&self, operation: M) -> Arc<MutationStore<M>> {
        let path = operation.path();
        let mut stores = self.stores.lock();
        if let Some(existing) = stores.get(&path) {
            if let Some(store) = downcast_mutation::<M>(existing.clone()) {
                return store;
            }
        }
        self.make_room(&mut stores);
        let store = MutationStore::new(operation, self.default_options.clone());
        stores.insert(path, store.clone());
        store
    }

    /// Seeds another path's query cache directly, bypassing its operation.
    /// Typical use: a mutation's result already contains the up-to-date
    /// value for some unrelated query's path, so rerunning that query would
    /// be wasted work.
    pub fn seed_query<Q: Query>(&self, operation: Q, value: Q::Value) {
        self.query_store(operation).set_result(Ok(value));
    }
}
