//! External reactive attachment point for a store.
//!
//! A `Controller` holds a [`Weak`] reference rather than an `Arc`, so it
//! never keeps a store alive on its own — only active subscribers (via
//! [`crate::client::Client`]'s cache) do that. Calling into a controller
//! whose store has since been evicted and dropped reports
//! [`crate::error::EngineError::ControllerAfterDrop`] through the
//! configured [`WarningReporter`] instead of panicking, and the call
//! returns `None`.

use crate::context::Context;
use crate::error::EngineError;
use crate::operation::{Mutation, PaginatedQuery, Query};
use crate::state::{OperationStatus, Pages};
use crate::store::{MutationStore, PaginatedStore, QueryStore};
use crate::warning::{default_reporter, WarningReporter};
use std::sync::{Arc, Weak};

pub struct Controller<S: ?Sized> {
    store: Weak<S>,
    warning_reporter: Arc<dyn WarningReporter>,
}

impl<S: ?Sized> Controller<S> {
    pub fn new(store: &Arc<S>) -> Self {
        Self {
            store: Arc::downgrade(store),
            warning_reporter: default_reporter(),
        }
    }

    fn upgrade(&self) -> Option<Arc<S>> {
        match self.store.upgrade() {
            Some(store) => Some(store),
            None => {
                self.warning_reporter.report(&EngineError::ControllerAfterDrop);
                None
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.store.strong_count() > 0
    }
}

/// Synonym matching the vocabulary consumers expect when asking "give me a
/// handle to drive this store" rather than "give me a store".
pub type Controls<S> = Controller<S>;

impl<Q: Query> Controller<QueryStore<Q>> {
    pub async fn run(&self, context: Context) -> Option<OperationStatus<Q::Value, Q::Failure>> {
        let store = self.upgrade()?;
        Some(store.run(context).await)
    }

    pub async fn run_if_stale(&self, context: Context) -> Option<OperationStatus<Q::Value, Q::Failure>> {
        let store = self.upgrade()?;
        Some(store.run_if_stale(context).await)
    }

    pub fn cancel(&self) {
        if let Some(store) = self.upgrade() {
            store.cancel_current_run();
        }
    }

    pub fn reset(&self) {
        if let Some(store) = self.upgrade() {
            store.reset_state();
        }
    }

    pub fn snapshot(&self) -> Option<OperationStatus<Q::Value, Q::Failure>> {
        self.upgrade().map(|store| store.snapshot())
    }
}

impl<P: PaginatedQuery> Controller<PaginatedStore<P>> {
    pub async fn fetch_next_page(&self, context: Context) -> Option<OperationStatus<Pages<P::PageId, P::PageValue>, P::Failure>> {
        let store = self.upgrade()?;
        Some(store.fetch_next_page(context).await)
    }

    pub async fn fetch_previous_page(&self, context: Context) -> Option<OperationStatus<Pages<P::PageId, P::PageValue>, P::Failure>> {
        let store = self.upgrade()?;
        Some(store.fetch_previous_page(context).await)
    }

    pub async fn refetch_all_pages(&self, context: Context) -> Option<OperationStatus<Pages<P::PageId, P::PageValue>, P::Failure>> {
        let store = self.upgrade()?;
        Some(store.refetch_all_pages(context).await)
    }

    pub fn reset(&self) {
        if let Some(store) = self.upgrade() {
            store.reset_state();
        }
    }

    pub fn snapshot(&self) -> Option<OperationStatus<Pages<P::PageId, P::PageValue>, P::Failure>> {
        self.upgrade().map(|store| store.snapshot())
    }
}

impl<M: Mutation> Controller<MutationStore<M>> {
    pub async fn run(&self, arguments: M::Arguments, context: Context) -> Option<Result<M::Value, M::Failure>> {
        let store = self.upgrade()?;
        Some(store.run(arguments, context).await)
    }

    pub fn reset(&self) {
        if let Some(store) = self.upgrade() {
            store.reset_state();
        }
    }
}
