//! Delay abstraction so a custom store can replace `tokio::time::sleep`
//! with something instrumented or entirely synthetic in tests.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Delayer: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelayer;

#[async_trait]
impl Delayer for TokioDelayer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
