use std::time::Duration;

use async_trait::async_trait;

/// Source of delays for the periodic loops.
///
/// Loops never read wall-clock time directly; they only wait on the clock, so
/// a test clock can release ticks one at a time.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
