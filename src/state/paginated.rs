//! State shape for a paginated query: an ordered list of pages, each keyed
//! by a unique page id, plus the same value/error counters as
//! [`crate::state::single::SingleState`].

use crate::state::status::OperationStatus;
use crate::task::TaskId;
use std::collections::HashSet;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Page<ID, V> {
    pub page_id: ID,
    pub value: V,
}

/// Invariant: page ids are unique within a `Pages` list. `upsert_*`
/// enforces this by replacing an existing entry rather than appending a
/// duplicate.
#[derive(Debug, Clone)]
pub struct Pages<ID, V> {
    entries: Vec<Page<ID, V>>,
}

impl<ID: PartialEq + Clone, V: Clone> Pages<ID, V> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn from_vec(entries: Vec<Page<ID, V>>) -> Self {
        Self { entries }
    }

    pub fn first(&self) -> Option<&Page<ID, V>> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&Page<ID, V>> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page<ID, V>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_page(&self, page_id: &ID) -> bool {
        self.entries.iter().any(|p| &p.page_id == page_id)
    }

    pub fn upsert_append(&mut self, page: Page<ID, V>) {
        match self.entries.iter().position(|p| p.page_id == page.page_id) {
            Some(i) => self.entries[i] = page,
            None => self.entries.push(page),
        }
    }

    pub fn upsert_prepend(&mut self, page: Page<ID, V>) {
        match self.entries.iter().position(|p| p.page_id == page.page_id) {
            Some(i) => self.entries[i] = page,
            None => self.entries.insert(0, page),
        }
    }

    pub fn replace_all(&mut self, entries: Vec<Page<ID, V>>) {
        self.entries = entries;
    }
}

impl<ID: PartialEq + Clone, V: Clone> Default for Pages<ID, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct PaginatedState<ID, V, E> {
    initial_pages: Pages<ID, V>,
    pub pages: Pages<ID, V>,
    pub value_update_count: u64,
    pub value_last_updated_at: Option<Instant>,
    current_error: Option<E>,
    pub error_update_count: u64,
    pub error_last_updated_at: Option<Instant>,
    pub active_tasks: HashSet<TaskId>,
}

impl<ID: PartialEq + Clone, V: Clone, E: Clone> PaginatedState<ID, V, E> {
    pub fn new() -> Self {
        Self {
            initial_pages: Pages::new(),
            pages: Pages::new(),
            value_update_count: 0,
            value_last_updated_at: None,
            current_error: None,
            error_update_count: 0,
            error_last_updated_at: None,
            active_tasks: HashSet::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.active_tasks.is_empty()
    }

    pub fn status(&self) -> OperationStatus<Pages<ID, V>, E> {
        if self.is_loading() {
            return OperationStatus::Loading;
        }
        match (self.value_last_updated_at, self.error_last_updated_at) {
            (None, None) => OperationStatus::Idle,
            (Some(_), None) => OperationStatus::Success(self.pages.clone()),
            (None, Some(_)) => OperationStatus::Failure(
                self.current_error.clone().expect("error timestamp implies an error"),
            ),
            (Some(vt), Some(et)) if vt >= et => OperationStatus::Success(self.pages.clone()),
            (Some(_), Some(_)) => OperationStatus::Failure(
                self.current_error.clone().expect("error timestamp implies an error"),
            ),
        }
    }

    pub fn apply_append(&mut self, page: Page<ID, V>, now: Instant) {
        self.pages.upsert_append(page);
        self.value_update_count += 1;
        self.value_last_updated_at = Some(now);
    }

    pub fn apply_prepend(&mut self, page: Page<ID, V>, now: Instant) {
        self.pages.upsert_prepend(page);
        self.value_update_count += 1;
        self.value_last_updated_at = Some(now);
    }

    pub fn apply_replace_all(&mut self, pages: Vec<Page<ID, V>>, now: Instant) {
        self.pages.replace_all(pages);
        self.value_update_count += 1;
        self.value_last_updated_at = Some(now);
    }

    pub fn apply_failure(&mut self, error: E, now: Instant) {
        self.current_error = Some(error);
        self.error_update_count += 1;
        self.error_last_updated_at = Some(now);
    }

    pub fn reset(&mut self) {
        let initial = self.initial_pages.clone();
        *self = Self::new();
        self.pages = initial.clone();
        self.initial_pages = initial;
    }
}

impl<ID: PartialEq + Clone, V: Clone, E: Clone> Default for PaginatedState<ID, V, E> {
    fn default() -> Self {
        Self::new()
    }
}
