//! Dedup'd, cancellable, dependency-ordered unit of asynchronous work.
//!
//! A [`Task`] runs its closure at most once: the first caller of
//! [`Task::run_if_needed`] executes the work, every other concurrent caller
//! awaits the same result. This mirrors the single-flight guarantee the
//! teacher's task store gives per `task_id`, except here there is no
//! backend to persist the record in — the dedup lives entirely in the
//! in-process `watch` channel below.

use crate::context::Context;
use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The terminal outcome of a task. Distinct from `Result<V, E>` because
/// cancellation must never be recorded as a failed update to a store's
/// state — a cancelled task simply leaves state untouched.
#[derive(Debug, Clone)]
pub enum RunOutcome<V, E> {
    Success(V),
    Failure(E),
    Cancelled,
}

impl<V, E> From<RunOutcome<V, E>> for Option<Result<V, E>> {
    fn from(outcome: RunOutcome<V, E>) -> Self {
        match outcome {
            RunOutcome::Success(v) => Some(Ok(v)),
            RunOutcome::Failure(e) => Some(Err(e)),
            RunOutcome::Cancelled => None,
        }
    }
}

/// Type-erased handle used to await another task's completion without
/// knowing its `Value`/`Failure` types — how a [`Task`] awaits
/// heterogeneous dependencies before running its own work.
#[async_trait]
pub trait ErasedTask: Send + Sync {
    fn id(&self) -> TaskId;

    /// Waits for the task to reach a terminal state. Dependency failures
    /// and cancellation are both treated as "done" — only success vs.
    /// failure is meaningful to the dependency's *own* caller, not to
    /// whoever merely ordered after it.
    async fn wait_until_finished(&self);
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unscheduled,
    Running,
    Finished,
}

type Work<V, E> = Arc<
    dyn Fn(TaskId, Context, CancellationToken) -> BoxFuture<'static, RunOutcome<V, E>> + Send + Sync,
>;

pub struct Task<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    id: TaskId,
    context: Context,
    dependencies: Vec<Arc<dyn ErasedTask>>,
    cancel_token: CancellationToken,
    phase: Arc<Mutex<Phase>>,
    result_tx: Arc<tokio::sync::watch::Sender<Option<RunOutcome<V, E>>>>,
    result_rx: tokio::sync::watch::Receiver<Option<RunOutcome<V, E>>>,
    work: Work<V, E>,
}

impl<V, E> Task<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(context: Context, work: F) -> Self
    where
        F: Fn(TaskId, Context, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = RunOutcome<V, E>> + Send + 'static,
    {
        let (result_tx, result_rx) = tokio::sync::watch::channel(None);
        Self {
            id: TaskId::new(),
            context,
            dependencies: Vec::new(),
            cancel_token: CancellationToken::new(),
            phase: Arc::new(Mutex::new(Phase::Unscheduled)),
            result_tx: Arc::new(result_tx),
            result_rx,
            work: Arc::new(move |id, cx, token| Box::pin(work(id, cx, token))),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Registers tasks that must finish (successfully or not) before this
    /// task's own work begins. Call before the first `run_if_needed`.
    pub fn schedule_after(&mut self, dependencies: impl IntoIterator<Item = Arc<dyn ErasedTask>>) {
        self.dependencies.extend(dependencies);
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    fn finish(&self, outcome: RunOutcome<V, E>) {
        let mut phase = self.phase.lock();
        if *phase == Phase::Finished {
            return;
        }
        *phase = Phase::Finished;
        drop(phase);
        let _ = self.result_tx.send(Some(outcome));
    }

    /// Cancels the task. If it hasn't started, it finishes immediately as
    /// [`RunOutcome::Cancelled`]. If it's running, its cancellation token is
    /// tripped and the in-flight `execute` call finalizes the cancellation.
    pub fn cancel(&self) {
        let phase = *self.phase.lock();
        match phase {
            Phase::Unscheduled => self.finish(RunOutcome::Cancelled),
            Phase::Running => self.cancel_token.cancel(),
            Phase::Finished => {}
        }
    }

    async fn execute(&self) -> RunOutcome<V, E> {
        for dependency in &self.dependencies {
            dependency.wait_until_finished().await;
        }
        let fut = (self.work)(self.id, self.context.clone(), self.cancel_token.clone());
        let outcome = tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => RunOutcome::Cancelled,
            outcome = fut => outcome,
        };
        self.finish(outcome.clone());
        outcome
    }

    /// Runs the task's work if it hasn't started yet, otherwise awaits
    /// whichever caller is already running it (or the cached result, if it
    /// already finished).
    pub async fn run_if_needed(&self) -> RunOutcome<V, E> {
        // Deciding who runs must happen under the phase lock so two
        // concurrent callers can't both observe `Unscheduled`.
        let i_am_runner = {
            let mut phase = self.phase.lock();
            match *phase {
                Phase::Finished => false,
                Phase::Running => false,
                Phase::Unscheduled => {
                    *phase = Phase::Running;
                    true
                }
            }
        };
        if i_am_runner {
            return self.execute().await;
        }
        if let Some(outcome) = self.result_rx.borrow().clone() {
            return outcome;
        }
        let mut rx = self.result_rx.clone();
        loop {
            if let Some(outcome) = rx.borrow().clone() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return RunOutcome::Cancelled;
            }
        }
    }
}

#[async_trait]
impl<V, E> ErasedTask for Task<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn id(&self) -> TaskId {
        self.id
    }

    async fn wait_until_finished(&self) {
        let _ = self.run_if_needed().await;
    }
}

/// A view onto a [`Task`] that transforms its success value, sharing the
/// same identity and dedup semantics as the task it wraps.
pub struct MappedTask<V, E, V2, F>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(V) -> V2 + Send + Sync + 'static,
{
    inner: Arc<Task<V, E>>,
    transform: Arc<F>,
}

impl<V, E, V2, F> MappedTask<V, E, V2, F>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(V) -> V2 + Send + Sync + 'static,
{
    pub fn new(inner: Arc<Task<V, E>>, transform: F) -> Self {
        Self {
            inner,
            transform: Arc::new(transform),
        }
    }

    pub fn id(&self) -> TaskId {
        self.inner.id()
    }

    pub async fn run_if_needed(&self) -> RunOutcome<V2, E> {
        match self.inner.run_if_needed().await {
            RunOutcome::Success(v) => RunOutcome::Success((self.transform)(v)),
            RunOutcome::Failure(e) => RunOutcome::Failure(e),
            RunOutcome::Cancelled => RunOutcome::Cancelled,
        }
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

/// Detects cycles among a set of tasks' declared dependencies, returning
/// one representative cycle (as an ordered list of ids) per strongly
/// connected offender. Used by [`crate::store::Store`] when scheduling a
/// batch of interdependent tasks together; a detected cycle is reported via
/// [`crate::warning::WarningReporter`], not a panic, since the tasks
/// involved may still make partial progress.
pub fn detect_cycle(dependencies: &std::collections::HashMap<TaskId, Vec<TaskId>>) -> Option<Vec<TaskId>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }
    let mut marks: std::collections::HashMap<TaskId, Mark> = std::collections::HashMap::new();
    let mut stack: Vec<TaskId> = Vec::new();

    fn visit(
        node: TaskId,
        dependencies: &std::collections::HashMap<TaskId, Vec<TaskId>>,
        marks: &mut std::collections::HashMap<TaskId, Mark>,
        stack: &mut Vec<TaskId>,
    ) -> Option<Vec<TaskId>> {
        if let Some(Mark::Visiting) = marks.get(&node) {
            let start = stack.iter().position(|id| *id == node).unwrap_or(0);
            return Some(stack[start..].to_vec());
        }
        if let Some(Mark::Done) = marks.get(&node) {
            return None;
        }
        marks.insert(node, Mark::Visiting);
        stack.push(node);
        if let Some(deps) = dependencies.get(&node) {
            for dep in deps {
                if let Some(cycle) = visit(*dep, dependencies, marks, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    for node in dependencies.keys() {
        if let Some(cycle) = visit(*node, dependencies, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}
