//! Store for a [`crate::operation::PaginatedQuery`]: owns a
//! [`PaginatedState`] and exposes forward/backward/refetch-all entry points
//! instead of a single `run`.

use crate::clock::{Clock, SystemClock};
use crate::context::Context;
use crate::continuation::Continuation;
use crate::keys::{IsLastRetryAttemptKey, RetryIndexKey};
use crate::modifiers::StoreOptions;
use crate::operation::PaginatedQuery;
use crate::path::Path;
use crate::state::{OperationStatus, Page, PaginatedState, Pages};
use crate::subscription::Subscription;
use crate::task::{RunOutcome, Task};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

type FetchedPage<P> = Page<<P as PaginatedQuery>::PageId, <P as PaginatedQuery>::PageValue>;

struct Inner<P: PaginatedQuery> {
    state: PaginatedState<P::PageId, P::PageValue, P::Failure>,
}

pub struct PaginatedStore<P: PaginatedQuery> {
    operation: P,
    options: StoreOptions,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<P>>,
    version_tx: watch::Sender<u64>,
    version_rx: watch::Receiver<u64>,
    subscriber_count: AtomicUsize,
}

impl<P: PaginatedQuery> PaginatedStore<P> {
    pub fn new(operation: P, options: StoreOptions) -> Arc<Self> {
        Self::with_clock(operation, options, Arc::new(SystemClock))
    }

    pub fn with_clock(operation: P, options: StoreOptions, clock: Arc<dyn Clock>) -> Arc<Self> {
        let (version_tx, version_rx) = watch::channel(0);
        Arc::new(Self {
            operation,
            options,
            clock,
            inner: Mutex::new(Inner {
                state: PaginatedState::new(),
            }),
            version_tx,
            version_rx,
            subscriber_count: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> Path {
        self.operation.path()
    }

    pub fn snapshot(&self) -> OperationStatus<Pages<P::PageId, P::PageValue>, P::Failure> {
        self.inner.lock().state.status()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }

    fn notify_changed(&self) {
        self.version_tx.send_modify(|v| *v = v.wrapping_add(1));
    }

    pub fn subscribe(self: &Arc<Self>, on_change: impl Fn() + Send + Sync + 'static) -> Subscription {
        let mut rx = self.version_rx.clone();
        self.subscriber_count.fetch_add(1, Ordering::SeqCst);
        let handle = tokio::spawn(async move {
            loop {
                if rx.changed().await.is_err() {
                    break;
                }
                on_change();
            }
        });
        let store = self.clone();
        Subscription::new(move || {
            handle.abort();
            store.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        })
    }

    pub fn reset_state(&self) {
        self.inner.lock().state.reset();
        self.notify_changed();
    }

    /// Fetches the page after the last one currently held, or the first
    /// page if none have been fetched yet.
    pub async fn fetch_next_page(
        self: &Arc<Self>,
        context: Context,
    ) -> OperationStatus<Pages<P::PageId, P::PageValue>, P::Failure> {
        let requested = {
            let inner = self.inner.lock();
            if inner.state.pages.is_empty() {
                None
            } else {
                match self.operation.next_page_id(&inner.state.pages, &context) {
                    Some(id) => Some(id),
                    None => return self.snapshot(),
                }
            }
        };
        match self.fetch_one(requested, context).await {
            RunOutcome::Success(page) => self.commit_append(page),
            RunOutcome::Failure(error) => self.commit_failure(error),
            RunOutcome::Cancelled => {}
        }
        self.snapshot()
    }

    /// Fetches the page before the first one currently held. A no-op if no
    /// pages exist yet or [`PaginatedQuery::previous_page_id`] reports
    /// there is nothing earlier.
    pub async fn fetch_previous_page(
        self: &Arc<Self>,
        context: Context,
    ) -> OperationStatus<Pages<P::PageId, P::PageValue>, P::Failure> {
        let requested = {
            let inner = self.inner.lock();
            if inner.state.pages.is_empty() {
                return self.snapshot();
            }
            match self.operation.previous_page_id(&inner.state.pages, &context) {
                Some(id) => id,
                None => return self.snapshot(),
            }
        };
        match self.fetch_one(Some(requested), context).await {
            RunOutcome::Success(page) => self.commit_prepend(page),
            RunOutcome::Failure(error) => self.commit_failure(error),
            RunOutcome::Cancelled => {}
        }
        self.snapshot()
    }

    /// Refetches every page currently held, starting from the first,
    /// replacing the whole list atomically once all refetches succeed. On
    /// the first failure, the existing page list is left untouched and the
    /// error is recorded.
    pub async fn refetch_all_pages(
        self: &Arc<Self>,
        context: Context,
    ) -> OperationStatus<Pages<P::PageId, P::PageValue>, P::Failure> {
        let existing_ids: Vec<Option<P::PageId>> = {
            let inner = self.inner.lock();
            if inner.state.pages.is_empty() {
                vec![None]
            } else {
                inner.state.pages.iter().map(|p| Some(p.page_id.clone())).collect()
            }
        };

        let mut refetched = Vec::with_capacity(existing_ids.len());
        for page_id in existing_ids {
            match self.fetch_one(page_id, context.clone()).await {
                RunOutcome::Success(page) => refetched.push(page),
                RunOutcome::Failure(error) => {
                    self.commit_failure(error);
                    return self.snapshot();
                }
                RunOutcome::Cancelled => return self.snapshot(),
            }
        }
        let now = self.clock.now();
        self.inner.lock().state.apply_replace_all(refetched, now);
        self.notify_changed();
        self.snapshot()
    }

    fn commit_append(&self, page: FetchedPage<P>) {
        let now = self.clock.now();
        self.inner.lock().state.apply_append(page, now);
        self.notify_changed();
    }

    fn commit_prepend(&self, page: FetchedPage<P>) {
        let now = self.clock.now();
        self.inner.lock().state.apply_prepend(page, now);
        self.notify_changed();
    }

    fn commit_failure(&self, error: P::Failure) {
        let now = self.clock.now();
        self.inner.lock().state.apply_failure(error, now);
        self.notify_changed();
    }

    async fn fetch_one(self: &Arc<Self>, page_id: Option<P::PageId>, context: Context) -> RunOutcome<FetchedPage<P>, P::Failure> {
        let store = self.clone();
        let task = Arc::new(Task::new(context, move |_id, cx, cancel_token| {
            let store = store.clone();
            let page_id = page_id.clone();
            async move { store.execute_page_with_retry(page_id, cx, cancel_token).await }
        }));
        {
            self.inner.lock().state.active_tasks.insert(task.id());
        }
        self.notify_changed();
        let outcome = task.run_if_needed().await;
        {
            self.inner.lock().state.active_tasks.remove(&task.id());
        }
        self.notify_changed();
        outcome
    }

    async fn execute_page_with_retry(
        self: Arc<Self>,
        page_id: Option<P::PageId>,
        context: Context,
        cancel_token: CancellationToken,
    ) -> RunOutcome<FetchedPage<P>, P::Failure> {
        let mut retry_index = 0u32;
        loop {
            if cancel_token.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            let mut attempt_context = context.clone();
            attempt_context.set::<RetryIndexKey>(retry_index);
            attempt_context.set::<IsLastRetryAttemptKey>(self.options.retry.is_last_attempt(retry_index));

            let (continuation, mut receiver) = Continuation::new();
            let drain_handle = tokio::spawn(async move {
                while let Some(envelope) = receiver.recv().await {
                    let _ = envelope.ack.send(());
                }
            });

            let result = self
                .operation
                .fetch_page(page_id.clone(), attempt_context, &continuation)
                .await;
            drop(continuation);
            let _ = drain_handle.await;

            match result {
                Ok((resolved_id, value)) => {
                    return RunOutcome::Success(Page {
                        page_id: resolved_id,
                        value,
                    })
                }
                Err(error) => {
                    if self.options.retry.should_retry(retry_index) {
                        let delay = self.options.backoff.delay_for(retry_index);
                        self.options.delayer.sleep(delay).await;
                        retry_index += 1;
                        continue;
                    }
                    return RunOutcome::Failure(error);
                }
            }
        }
    }
}
