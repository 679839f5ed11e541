//! State shape for a mutation: a bounded history of attempts, each
//! recording its own arguments, timing, and result, rather than a single
//! current value/error pair. Mirrors the teacher's `TaskRecord` in spirit —
//! an identified, timestamped record of one execution — but scoped to a
//! single mutation path's in-memory history rather than a persisted task.

use crate::task::TaskId;
use std::collections::{HashSet, VecDeque};
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Attempt<A, V, E> {
    pub id: Uuid,
    pub arguments: A,
    pub started_at: Instant,
    pub last_updated_at: Option<Instant>,
    pub result: Option<Result<V, E>>,
    pub task_id: TaskId,
}

impl<A, V, E> Attempt<A, V, E> {
    pub fn new(arguments: A, task_id: TaskId, started_at: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            arguments,
            started_at,
            last_updated_at: None,
            result: None,
            task_id,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }
}

/// Bounded FIFO history of attempts. `max_history_length` is clamped to at
/// least 1 by [`crate::error::EngineError::MutationRunWithoutHistory`]'s
/// caller — a history of zero would make "run without history" the only
/// possible state.
#[derive(Debug, Clone)]
pub struct MutationState<A, V, E> {
    history: VecDeque<Attempt<A, V, E>>,
    max_history_length: usize,
    pub active_tasks: HashSet<TaskId>,
}

impl<A: Clone, V: Clone, E: Clone> MutationState<A, V, E> {
    pub fn new(max_history_length: usize) -> Self {
        Self {
            history: VecDeque::new(),
            max_history_length: max_history_length.max(1),
            active_tasks: HashSet::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.active_tasks.is_empty()
    }

    pub fn history(&self) -> impl Iterator<Item = &Attempt<A, V, E>> {
        self.history.iter()
    }

    pub fn push_attempt(&mut self, attempt: Attempt<A, V, E>) {
        self.history.push_back(attempt);
        while self.history.len() > self.max_history_length {
            self.history.pop_front();
        }
    }

    /// Returns `false` if no attempt with `task_id` was found — e.g. it was
    /// evicted by `max_history_length` before its result arrived. Callers
    /// treat that as a warning-worthy condition, not a silent no-op.
    pub fn record_result(&mut self, task_id: TaskId, result: Result<V, E>, now: Instant) -> bool {
        if let Some(attempt) = self.history.iter_mut().rev().find(|a| a.task_id == task_id) {
            attempt.result = Some(result);
            attempt.last_updated_at = Some(now);
            true
        } else {
            false
        }
    }

    /// The most recently *completed* attempt, independent of insertion
    /// order — an in-flight retry started after a finished attempt doesn't
    /// count until it, too, has a result.
    pub fn latest_completed(&self) -> Option<&Attempt<A, V, E>> {
        self.history
            .iter()
            .filter(|a| a.is_finished())
            .max_by_key(|a| a.last_updated_at)
    }

    pub fn current_value(&self) -> Option<&V> {
        self.latest_completed()
            .and_then(|a| a.result.as_ref())
            .and_then(|r| r.as_ref().ok())
    }

    pub fn current_error(&self) -> Option<&E> {
        self.latest_completed()
            .and_then(|a| a.result.as_ref())
            .and_then(|r| r.as_ref().err())
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.active_tasks.clear();
    }
}
