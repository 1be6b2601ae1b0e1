use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use crate::application::Clock;

/// Wall-clock delays backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl TokioClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test clock: every `sleep` waits for one tick released by [`Self::advance`].
///
/// Durations are recorded but not waited for, so loops run exactly as fast
/// as the test drives them.
pub struct ManualClock {
    ticks: Semaphore,
    sleeps_started: AtomicUsize,
    requested: Mutex<Vec<Duration>>,
    parked: Notify,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            ticks: Semaphore::new(0),
            sleeps_started: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
            parked: Notify::new(),
        }
    }

    /// Releases one pending (or the next) sleep.
    pub fn advance(&self) {
        self.ticks.add_permits(1);
    }

    pub fn sleeps_started(&self) -> usize {
        self.sleeps_started.load(Ordering::SeqCst)
    }

    /// Durations passed to `sleep`, in call order.
    pub fn requested(&self) -> Vec<Duration> {
        self.requested
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Waits until at least `count` sleeps have begun in total.
    pub async fn wait_for_sleeps(&self, count: usize) {
        loop {
            let parked = self.parked.notified();
            if self.sleeps_started() >= count {
                return;
            }
            parked.await;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, duration: Duration) {
        self.requested
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(duration);
        self.sleeps_started.fetch_add(1, Ordering::SeqCst);
        self.parked.notify_waiters();

        if let Ok(permit) = self.ticks.acquire().await {
            permit.forget();
        }
    }
}
