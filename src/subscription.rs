//! RAII handle returned by every subscribe-style API in the engine: store
//! subscriptions, run-specification subscriptions, controller attachments.
//! Dropping it runs its cleanup exactly once.

pub struct Subscription {
    cleanup: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cleanup: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// A subscription with nothing to clean up, for combinators whose
    /// children have nothing to unsubscribe from (e.g. [`crate::run_spec::Always`]).
    pub fn noop() -> Self {
        Self { cleanup: None }
    }

    /// Consumes the handle without running its cleanup, transferring
    /// responsibility to whatever took ownership of the dropped value.
    pub fn cancel(mut self) {
        self.cleanup = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}
