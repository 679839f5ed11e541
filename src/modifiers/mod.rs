//! The store's modifier pipeline, collapsed at construction time into a
//! single [`StoreOptions`] config rather than a dynamically composed chain
//! of middleware. A store's built-in tunables (retry, backoff, delayer,
//! staleness, automatic running, rerun-on-change) are fixed fields set
//! through a fluent builder — the same texture as the teacher's
//! `StoreConfig`/`GenericTaskStore::with_config` builder pattern — while
//! open-ended extension points (arbitrary [`crate::controller::Controller`]s
//! and event handlers) remain a `Vec` of trait objects registered after
//! construction, since those genuinely can't be known in advance.

pub mod backoff;
pub mod delay;
pub mod retry;
pub mod stale;

use crate::modifiers::backoff::{BackoffFunction, ExponentialBackoff};
use crate::modifiers::delay::{Delayer, TokioDelayer};
use crate::modifiers::retry::RetryPolicy;
use crate::modifiers::stale::StaleRule;
use std::sync::Arc;

/// Configuration consumed once when a [`crate::store::Store`] is built.
///
/// Constructed with the same chained-builder texture as
/// `GenericTaskStore::with_config().with_security().with_poll_interval()`.
#[derive(Clone)]
pub struct StoreOptions {
    pub retry: RetryPolicy,
    pub backoff: Arc<dyn BackoffFunction>,
    pub delayer: Arc<dyn Delayer>,
    pub stale: StaleRule,
    pub deduplicate: bool,
    pub automatic_running_enabled: bool,
    pub rerun_on_application_active: bool,
    pub rerun_on_network_connected: bool,
    pub mutation_history_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            backoff: Arc::new(ExponentialBackoff::default()),
            delayer: Arc::new(TokioDelayer),
            stale: StaleRule::default(),
            deduplicate: true,
            automatic_running_enabled: true,
            rerun_on_application_active: true,
            rerun_on_network_connected: true,
            mutation_history_limit: 25,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn backoff(mut self, backoff: impl BackoffFunction + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    pub fn delayer(mut self, delayer: impl Delayer + 'static) -> Self {
        self.delayer = Arc::new(delayer);
        self
    }

    pub fn stale(mut self, rule: StaleRule) -> Self {
        self.stale = rule;
        self
    }

    pub fn deduplicated(mut self, enabled: bool) -> Self {
        self.deduplicate = enabled;
        self
    }

    pub fn enable_automatic_running(mut self, enabled: bool) -> Self {
        self.automatic_running_enabled = enabled;
        self
    }

    pub fn rerun_on_application_active(mut self, enabled: bool) -> Self {
        self.rerun_on_application_active = enabled;
        self
    }

    pub fn rerun_on_network_connected(mut self, enabled: bool) -> Self {
        self.rerun_on_network_connected = enabled;
        self
    }

    pub fn mutation_history_limit(mut self, limit: usize) -> Self {
        self.mutation_history_limit = limit.max(1);
        self
    }
}
