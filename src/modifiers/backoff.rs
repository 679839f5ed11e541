//! Backoff functions consulted by the retry modifier between attempts.

use std::time::Duration;

pub trait BackoffFunction: Send + Sync {
    fn delay_for(&self, retry_index: u32) -> Duration;
}

/// `base * 2^retry_index`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(200),
            max: Duration::from_secs(30),
        }
    }
}

impl BackoffFunction for ExponentialBackoff {
    fn delay_for(&self, retry_index: u32) -> Duration {
        let factor = 1u32.checked_shl(retry_index).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantBackoff(pub Duration);

impl BackoffFunction for ConstantBackoff {
    fn delay_for(&self, _retry_index: u32) -> Duration {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_doubles_each_attempt() {
        let backoff = ExponentialBackoff {
            base: Duration::from_millis(100),
            max: Duration::from_secs(10),
        };
        assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for(1), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn exponential_backoff_caps_at_max() {
        let backoff = ExponentialBackoff {
            base: Duration::from_millis(100),
            max: Duration::from_millis(300),
        };
        assert_eq!(backoff.delay_for(10), Duration::from_millis(300));
    }

    #[test]
    fn constant_backoff_ignores_retry_index() {
        let backoff = ConstantBackoff(Duration::from_millis(50));
        assert_eq!(backoff.delay_for(0), backoff.delay_for(9));
    }
}
