//! State shape for a plain query or mutation result: one current value, one
//! current error, each with its own monotone update counter and timestamp.

use crate::state::status::OperationStatus;
use crate::task::TaskId;
use std::collections::HashSet;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SingleState<V, E> {
    initial_value: Option<V>,
    current_value: Option<V>,
    pub value_update_count: u64,
    pub value_last_updated_at: Option<Instant>,
    current_error: Option<E>,
    pub error_update_count: u64,
    pub error_last_updated_at: Option<Instant>,
    pub active_tasks: HashSet<TaskId>,
}

impl<V: Clone, E: Clone> SingleState<V, E> {
    pub fn new(initial_value: Option<V>) -> Self {
        Self {
            current_value: initial_value.clone(),
            initial_value,
            value_update_count: 0,
            value_last_updated_at: None,
            current_error: None,
            error_update_count: 0,
            error_last_updated_at: None,
            active_tasks: HashSet::new(),
        }
    }

    pub fn current_value(&self) -> Option<&V> {
        self.current_value.as_ref()
    }

    pub fn current_error(&self) -> Option<&E> {
        self.current_error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        !self.active_tasks.is_empty()
    }

    /// Most-recent-wins: whichever of value/error was last updated
    /// determines the reported status; a task in flight always reports
    /// `Loading` regardless of prior results.
    pub fn status(&self) -> OperationStatus<V, E> {
        if self.is_loading() {
            return OperationStatus::Loading;
        }
        match (self.value_last_updated_at, self.error_last_updated_at) {
            (None, None) => OperationStatus::Idle,
            (Some(_), None) => OperationStatus::Success(
                self.current_value
                    .clone()
                    .expect("value timestamp implies a value is present"),
            ),
            (None, Some(_)) => OperationStatus::Failure(
                self.current_error
                    .clone()
                    .expect("error timestamp implies an error is present"),
            ),
            (Some(vt), Some(et)) if vt >= et => OperationStatus::Success(
                self.current_value
                    .clone()
                    .expect("value timestamp implies a value is present"),
            ),
            (Some(_), Some(_)) => OperationStatus::Failure(
                self.current_error
                    .clone()
                    .expect("error timestamp implies an error is present"),
            ),
        }
    }

    pub fn apply_success(&mut self, value: V, now: Instant) {
        self.current_value = Some(value);
        self.value_update_count += 1;
        self.value_last_updated_at = Some(now);
    }

    pub fn apply_failure(&mut self, error: E, now: Instant) {
        self.current_error = Some(error);
        self.error_update_count += 1;
        self.error_last_updated_at = Some(now);
    }

    pub fn reset(&mut self) {
        let initial = self.initial_value.clone();
        *self = Self::new(initial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn idle_before_any_update() {
        let state = SingleState::<i32, String>::new(None);
        assert!(matches!(state.status(), OperationStatus::Idle));
    }

    #[test]
    fn loading_while_a_task_is_active() {
        let mut state = SingleState::<i32, String>::new(None);
        state.active_tasks.insert(TaskId::new());
        assert!(state.status().is_loading());
    }

    #[test]
    fn most_recent_update_wins_on_conflicting_timestamps() {
        let mut state = SingleState::<i32, String>::new(None);
        let t0 = Instant::now();
        state.apply_success(1, t0);
        state.apply_failure("boom".to_string(), t0 + Duration::from_millis(1));
        assert_eq!(state.status().failure(), Some(&"boom".to_string()));

        state.apply_success(2, t0 + Duration::from_millis(2));
        assert_eq!(state.status().success(), Some(&2));
    }

    #[test]
    fn reset_restores_initial_value_and_clears_counters() {
        let mut state = SingleState::<i32, String>::new(Some(0));
        state.apply_success(99, Instant::now());
        state.reset();
        assert_eq!(state.current_value(), Some(&0));
        assert_eq!(state.value_update_count, 0);
    }
}
