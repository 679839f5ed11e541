//! Well-known [`crate::context::ContextKey`]s consulted by the store's
//! modifier pipeline. User code can define its own keys the same way; these
//! exist because the pipeline itself needs to agree on names with callers
//! that want to override retry/backoff/rerunning behavior per task.

use crate::clock::{Clock, SystemClock};
use crate::context::ContextKey;
use crate::modifiers::backoff::{BackoffFunction, ExponentialBackoff};
use crate::modifiers::delay::{Delayer, TokioDelayer};
use std::sync::Arc;

pub struct ClockKey;
impl ContextKey for ClockKey {
    type Value = Arc<dyn Clock>;
    fn default_value() -> Self::Value {
        Arc::new(SystemClock)
    }
}

pub struct DelayerKey;
impl ContextKey for DelayerKey {
    type Value = Arc<dyn Delayer>;
    fn default_value() -> Self::Value {
        Arc::new(TokioDelayer)
    }
}

pub struct BackoffFunctionKey;
impl ContextKey for BackoffFunctionKey {
    type Value = Arc<dyn BackoffFunction>;
    fn default_value() -> Self::Value {
        Arc::new(ExponentialBackoff::default())
    }
}

/// Set by the store before each attempt of a retried task.
pub struct RetryIndexKey;
impl ContextKey for RetryIndexKey {
    type Value = u32;
    fn default_value() -> u32 {
        0
    }
}

/// `true` on the attempt that will not be retried further if it fails.
pub struct IsLastRetryAttemptKey;
impl ContextKey for IsLastRetryAttemptKey {
    type Value = bool;
    fn default_value() -> bool {
        true
    }
}

/// Master switch consulted by the automatic-running modifier; when `false`
/// the store never schedules work on its own, only in response to explicit
/// calls.
pub struct EnableAutomaticRunningKey;
impl ContextKey for EnableAutomaticRunningKey {
    type Value = bool;
    fn default_value() -> bool {
        true
    }
}

pub struct IsApplicationActiveRerunningEnabledKey;
impl ContextKey for IsApplicationActiveRerunningEnabledKey {
    type Value = bool;
    fn default_value() -> bool {
        true
    }
}

pub struct IsNetworkRerunningEnabledKey;
impl ContextKey for IsNetworkRerunningEnabledKey {
    type Value = bool;
    fn default_value() -> bool {
        true
    }
}
