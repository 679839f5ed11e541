//! Store for a [`crate::operation::Mutation`]: every call to [`run`] starts
//! a fresh, undeduplicated attempt and appends it to a bounded
//! [`MutationState`] history rather than overwriting a single value.

use crate::clock::{Clock, SystemClock};
use crate::context::Context;
use crate::continuation::Continuation;
use crate::error::EngineError;
use crate::keys::{IsLastRetryAttemptKey, RetryIndexKey};
use crate::modifiers::StoreOptions;
use crate::operation::Mutation;
use crate::path::Path;
use crate::state::{Attempt, MutationState};
use crate::subscription::Subscription;
use crate::task::{RunOutcome, Task, TaskId};
use crate::warning::{default_reporter, WarningReporter};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

struct Inner<M: Mutation> {
    state: MutationState<M::Arguments, M::Value, M::Failure>,
}

pub struct MutationStore<M: Mutation> {
    operation: M,
    options: StoreOptions,
    clock: Arc<dyn Clock>,
    warning_reporter: Arc<dyn WarningReporter>,
    inner: Mutex<Inner<M>>,
    version_tx: watch::Sender<u64>,
    version_rx: watch::Receiver<u64>,
    subscriber_count: AtomicUsize,
}

impl<M: Mutation> MutationStore<M> {
    pub fn new(operation: M, options: StoreOptions) -> Arc<Self> {
        Self::with_clock(operation, options, Arc::new(SystemClock))
    }

    pub fn with_clock(operation: M, options: StoreOptions, clock: Arc<dyn Clock>) -> Arc<Self> {
        let (version_tx, version_rx) = watch::channel(0);
        let history_limit = options.mutation_history_limit;
        Arc::new(Self {
            operation,
            options,
            clock,
            warning_reporter: default_reporter(),
            inner: Mutex::new(Inner {
                state: MutationState::new(history_limit),
            }),
            version_tx,
            version_rx,
            subscriber_count: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> Path {
        self.operation.path()
    }

    pub fn history(&self) -> Vec<Attempt<M::Arguments, M::Value, M::Failure>> {
        self.inner.lock().state.history().cloned().collect()
    }

    pub fn current_value(&self) -> Option<M::Value>
    where
        M::Value: Clone,
    {
        self.inner.lock().state.current_value().cloned()
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

    /// Starts a new attempt. Unlike queries, mutations are never
    /// deduplicated — each call is a distinct, independently-tracked
    /// attempt, even if a structurally identical call is already running.
    pub async fn run(self: &Arc<Self>, arguments: M::Arguments, context: Context) -> Result<M::Value, M::Failure> {
        let now = self.clock.now();
        let store = self.clone();
        let args_for_work = arguments.clone();
        let task = Arc::new(Task::new(context, move |id, cx, cancel_token| {
            let store = store.clone();
            let arguments = args_for_work.clone();
            async move { store.execute_with_retry(id, arguments, cx, cancel_token).await }
        }));

        {
            let mut inner = self.inner.lock();
            inner.state.push_attempt(Attempt::new(arguments, task.id(), now));
            inner.state.active_tasks.insert(task.id());
        }
        self.notify_changed();

        let outcome = task.run_if_needed().await;

        let recorded = {
            let mut inner = self.inner.lock();
            inner.state.active_tasks.remove(&task.id());
            match &outcome {
                RunOutcome::Cancelled => true,
                RunOutcome::Success(value) => {
                    inner
                        .state
                        .record_result(task.id(), Ok(value.clone()), self.clock.now())
                }
                RunOutcome::Failure(error) => {
                    inner
                        .state
                        .record_result(task.id(), Err(error.clone()), self.clock.now())
                }
            }
        };
        if !recorded {
            self.warning_reporter.report(&EngineError::MutationRunWithoutHistory);
        }
        self.notify_changed();

        match outcome {
            RunOutcome::Success(value) => Ok(value),
            RunOutcome::Failure(error) => Err(error),
            RunOutcome::Cancelled => {
                // A cancelled mutation has no `Result` to return; callers
                // that need to distinguish this from a real failure should
                // hold onto the task id via `history()` instead.
                unreachable!("mutation run was awaited directly and cannot observe external cancellation")
            }
        }
    }

    async fn execute_with_retry(
        self: Arc<Self>,
        _task_id: TaskId,
        arguments: M::Arguments,
        context: Context,
        cancel_token: CancellationToken,
    ) -> RunOutcome<M::Value, M::Failure> {
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

            let result = self.operation.run(arguments.clone(), attempt_context, &continuation).await;
            drop(continuation);
            let _ = drain_handle.await;

            match result {
                Ok(value) => return RunOutcome::Success(value),
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
