use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::{Clock, RepositoryRegistry};

/// Default cadence of the background registry refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Keeps a [`RepositoryRegistry`] in sync while a listing view is active.
///
/// Refreshes once immediately, then once per `period`. Cancelling the token
/// stops the loop; a refresh still in flight is dropped before it can apply.
pub struct RegistrySync;

impl RegistrySync {
    pub fn spawn(
        registry: Arc<RepositoryRegistry>,
        clock: Arc<dyn Clock>,
        period: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            debug!("Registry sync started (every {:?})", period);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    result = registry.refresh() => {
                        if let Err(e) = result {
                            warn!("Background refresh failed: {}", e);
                        }
                    }
                }

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = clock.sleep(period) => {}
                }
            }
            debug!("Registry sync stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{InMemoryStore, ManualClock, MockBackend};

    #[tokio::test]
    async fn test_sleeps_for_configured_period() {
        let backend = Arc::new(MockBackend::new());
        let registry = Arc::new(RepositoryRegistry::new(
            backend.clone(),
            Arc::new(InMemoryStore::new()),
        ));
        let clock = Arc::new(ManualClock::new());
        let token = CancellationToken::new();

        let handle = RegistrySync::spawn(
            registry,
            clock.clone(),
            DEFAULT_REFRESH_INTERVAL,
            token.clone(),
        );
        clock.wait_for_sleeps(1).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(DEFAULT_REFRESH_INTERVAL, Duration::from_secs(5));
        assert_eq!(clock.requested(), vec![Duration::from_secs(5)]);
        assert_eq!(backend.list_calls(), 1);
    }
}
