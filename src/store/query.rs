//! Store for a plain [`crate::operation::Query`]: owns a [`SingleState`],
//! runs the modifier pipeline (retry/backoff/dedup/staleness) around the
//! operation, and fans changes out to subscribers via a version counter.

use crate::clock::{Clock, SystemClock};
use crate::context::Context;
use crate::continuation::{Continuation, Yield};
use crate::keys::{IsLastRetryAttemptKey, RetryIndexKey};
use crate::modifiers::StoreOptions;
use crate::operation::Query;
use crate::path::Path;
use crate::state::{OperationStatus, SingleState};
use crate::subscription::Subscription;
use crate::task::{RunOutcome, Task};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

struct Inner<Q: Query> {
    state: SingleState<Q::Value, Q::Failure>,
    current_task: Option<Arc<Task<Q::Value, Q::Failure>>>,
}

pub struct QueryStore<Q: Query> {
    operation: Q,
    options: StoreOptions,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<Q>>,
    version_tx: watch::Sender<u64>,
    version_rx: watch::Receiver<u64>,
    subscriber_count: AtomicUsize,
}

impl<Q: Query> QueryStore<Q> {
    pub fn new(operation: Q, options: StoreOptions) -> Arc<Self> {
        Self::with_clock(operation, options, Arc::new(SystemClock))
    }

    pub fn with_clock(operation: Q, options: StoreOptions, clock: Arc<dyn Clock>) -> Arc<Self> {
        let (version_tx, version_rx) = watch::channel(0);
        Arc::new(Self {
            operation,
            options,
            clock,
            inner: Mutex::new(Inner {
                state: SingleState::new(None),
                current_task: None,
            }),
            version_tx,
            version_rx,
            subscriber_count: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> Path {
        self.operation.path()
    }

    pub fn snapshot(&self) -> OperationStatus<Q::Value, Q::Failure> {
        self.inner.lock().state.status()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }

    fn notify_changed(&self) {
        self.version_tx.send_modify(|v| *v = v.wrapping_add(1));
    }

    /// Registers a callback invoked after every state change. The callback
    /// may be invoked spuriously (no observable change) but never skipped.
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

    /// Seeds the store's value directly, bypassing the operation entirely.
    /// Used by [`crate::client::Client`] to let one mutation's result
    /// populate another path's cache.
    pub fn set_result(&self, result: Result<Q::Value, Q::Failure>) {
        let now = self.clock.now();
        {
            let mut inner = self.inner.lock();
            match result {
                Ok(v) => inner.state.apply_success(v, now),
                Err(e) => inner.state.apply_failure(e, now),
            }
        }
        self.notify_changed();
    }

    fn apply_yield(&self, yielded: Yield<Q::Value, Q::Failure>) {
        let now = self.clock.now();
        {
            let mut inner = self.inner.lock();
            match yielded {
                Yield::Value(v) => inner.state.apply_success(v, now),
                Yield::Error(e) => inner.state.apply_failure(e, now),
            }
        }
        self.notify_changed();
    }

    fn is_stale(&self) -> bool {
        let inner = self.inner.lock();
        let now = self.clock.now();
        let most_recent = match (inner.state.value_last_updated_at, inner.state.error_last_updated_at) {
            (None, None) => None,
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(a), Some(b)) => Some(a.max(b)),
        };
        self.options.stale.is_stale(most_recent, now)
    }

    /// Runs the operation only if the cached result is stale (or absent);
    /// otherwise returns the cached status without scheduling any work.
    pub async fn run_if_stale(self: &Arc<Self>, context: Context) -> OperationStatus<Q::Value, Q::Failure> {
        if self.is_stale() {
            self.run(context).await
        } else {
            self.snapshot()
        }
    }

    /// Runs the operation, deduplicating against any already in-flight run
    /// when `options.deduplicate` is set.
    pub async fn run(self: &Arc<Self>, context: Context) -> OperationStatus<Q::Value, Q::Failure> {
        let task = self.task_for_run(context);
        {
            let mut inner = self.inner.lock();
            inner.state.active_tasks.insert(task.id());
        }
        self.notify_changed();

        let _outcome = task.run_if_needed().await;

        {
            let mut inner = self.inner.lock();
            inner.state.active_tasks.remove(&task.id());
            if inner.current_task.as_ref().map(|t| t.id()) == Some(task.id()) {
                inner.current_task = None;
            }
        }
        self.notify_changed();
        self.snapshot()
    }

    pub fn cancel_current_run(&self) {
        if let Some(task) = self.inner.lock().current_task.clone() {
            task.cancel();
        }
    }

    fn task_for_run(self: &Arc<Self>, context: Context) -> Arc<Task<Q::Value, Q::Failure>> {
        if self.options.deduplicate {
            if let Some(existing) = &self.inner.lock().current_task {
                return existing.clone();
            }
        }
        let store = self.clone();
        let task = Arc::new(Task::new(context, move |_id, cx, cancel_token| {
            let store = store.clone();
            async move { store.execute_with_retry(cx, cancel_token).await }
        }));
        self.inner.lock().current_task = Some(task.clone());
        task
    }

    async fn execute_with_retry(
        self: Arc<Self>,
        context: Context,
        cancel_token: CancellationToken,
    ) -> RunOutcome<Q::Value, Q::Failure> {
        let mut retry_index = 0u32;
        loop {
            if cancel_token.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            let mut attempt_context = context.clone();
            attempt_context.set::<RetryIndexKey>(retry_index);
            attempt_context.set::<IsLastRetryAttemptKey>(self.options.retry.is_last_attempt(retry_index));

            let (continuation, mut receiver) = Continuation::new();
            let drain_store = self.clone();
            let drain_handle = tokio::spawn(async move {
                while let Some(envelope) = receiver.recv().await {
                    drain_store.apply_yield(envelope.yielded);
                    let _ = envelope.ack.send(());
                }
            });

            let result = self.operation.run(attempt_context, &continuation).await;
            drop(continuation);
            let _ = drain_handle.await;

            match result {
                Ok(value) => {
                    self.apply_yield(Yield::Value(value.clone()));
                    return RunOutcome::Success(value);
                }
                Err(error) => {
                    if self.options.retry.should_retry(retry_index) {
                        let delay = self.options.backoff.delay_for(retry_index);
                        tracing::debug!(path = %self.operation.path(), retry_index, ?delay, "retrying query after failure");
                        self.options.delayer.sleep(delay).await;
                        retry_index += 1;
                        continue;
                    }
                    self.apply_yield(Yield::Error(error.clone()));
                    return RunOutcome::Failure(error);
                }
            }
        }
    }
}
