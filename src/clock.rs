//! Clock abstraction so retry/backoff/staleness logic can be driven by a
//! fake clock under `#[tokio::test(start_paused = true)]` instead of
//! wall-clock sleeps.

use std::time::Instant;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
