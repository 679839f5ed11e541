//! Out-of-band channel for conditions that are recoverable at runtime but
//! still indicate a bug worth a developer's attention: a dependency cycle
//! detected while scheduling, a [`crate::controller::Controller`] invoked
//! after its store is gone, a mutation rerun with an empty history. The
//! engine never panics for these (panics are reserved for
//! [`crate::error::EngineError::PathIndexOutOfRange`]-style misuse caught
//! in testing); instead it reports through this trait, whose default
//! implementation logs at `warn` level via `tracing`.

use crate::error::EngineError;
use std::sync::Arc;

pub trait WarningReporter: Send + Sync {
    fn report(&self, warning: &EngineError);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWarningReporter;

impl WarningReporter for TracingWarningReporter {
    fn report(&self, warning: &EngineError) {
        tracing::warn!(error = %warning, "engine warning");
    }
}

pub fn default_reporter() -> Arc<dyn WarningReporter> {
    Arc::new(TracingWarningReporter)
}
