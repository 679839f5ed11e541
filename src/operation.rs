//! The three kinds of work a [`crate::store::Store`] can run, each owning a
//! different [`crate::state`] shape. `Value`/`Failure` (and `PageValue` for
//! pagination) are bounded `Clone + Send + Sync + 'static` because they are
//! cloned into every subscriber fan-out and into the dedup'd [`crate::task::Task`]
//! that runs them — the same bound the teacher puts on anything stored
//! behind its `Arc<dyn TaskStore>` and handed to multiple callers.

use crate::context::Context;
use crate::continuation::Continuation;
use crate::path::Path;
use async_trait::async_trait;

/// A read operation producing a single value.
#[async_trait]
pub trait Query: Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;
    type Failure: Clone + Send + Sync + 'static;

    fn path(&self) -> Path;

    async fn run(
        &self,
        context: Context,
        continuation: &Continuation<Self::Value, Self::Failure>,
    ) -> Result<Self::Value, Self::Failure>;
}

/// A read operation producing an ordered list of pages, fetched
/// incrementally forward or backward from the existing set.
#[async_trait]
pub trait PaginatedQuery: Send + Sync + 'static {
    type PageId: Clone + Eq + std::hash::Hash + Send + Sync + 'static;
    type PageValue: Clone + Send + Sync + 'static;
    type Failure: Clone + Send + Sync + 'static;

    fn path(&self) -> Path;

    /// The page id to fetch next, given the current page list. `None` means
    /// there is no next page.
    fn next_page_id(
        &self,
        pages: &crate::state::Pages<Self::PageId, Self::PageValue>,
        context: &Context,
    ) -> Option<Self::PageId>;

    /// The page id to fetch going backward from the current first page.
    /// `None` means there is no previous page.
    fn previous_page_id(
        &self,
        pages: &crate::state::Pages<Self::PageId, Self::PageValue>,
        context: &Context,
    ) -> Option<Self::PageId>;

    /// Fetches one page. `page_id: None` means "fetch the first page".
    /// The returned id is the fetched page's own identity — for the first
    /// page, where the request carries no id, this is how the store learns
    /// what to key it under.
    async fn fetch_page(
        &self,
        page_id: Option<Self::PageId>,
        context: Context,
        continuation: &Continuation<Self::PageValue, Self::Failure>,
    ) -> Result<(Self::PageId, Self::PageValue), Self::Failure>;
}

/// A write operation taking arguments and producing a value, whose results
/// accumulate into a bounded attempt history rather than overwriting a
/// single current value.
#[async_trait]
pub trait Mutation: Send + Sync + 'static {
    type Arguments: Clone + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;
    type Failure: Clone + Send + Sync + 'static;

    fn path(&self) -> Path;

    async fn run(
        &self,
        arguments: Self::Arguments,
        context: Context,
        continuation: &Continuation<Self::Value, Self::Failure>,
    ) -> Result<Self::Value, Self::Failure>;
}
