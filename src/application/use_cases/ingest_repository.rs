use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::{Clock, IngestReceipt, RepositoryBackend, RepositoryRegistry};
use crate::domain::{
    CapacityError, DomainError, IngestError, IngestionOutcome, IngestionPhase, IngestionSnapshot,
    Repository, TerminalStatus, MAX_INDEXED_REPOSITORIES,
};

#[derive(Debug, Clone, Copy)]
pub struct IngestionSettings {
    pub poll_interval: Duration,
    /// How long a finished run stays visible before the workflow resets.
    pub grace_period: Duration,
    pub max_indexed: usize,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            grace_period: Duration::from_secs(2),
            max_indexed: MAX_INDEXED_REPOSITORIES,
        }
    }
}

/// Submits a repository for ingestion and follows it to a terminal state.
///
/// `Idle -> Submitting -> Polling -> Finished -> Idle`. Only one run is
/// active at a time; progress is published through [`Self::subscribe`].
pub struct IngestRepositoryUseCase {
    backend: Arc<dyn RepositoryBackend>,
    registry: Arc<RepositoryRegistry>,
    clock: Arc<dyn Clock>,
    settings: IngestionSettings,
    state: watch::Sender<IngestionSnapshot>,
    active_run: Mutex<Option<CancellationToken>>,
}

impl IngestRepositoryUseCase {
    pub fn new(
        backend: Arc<dyn RepositoryBackend>,
        registry: Arc<RepositoryRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(IngestionSnapshot::idle());
        Self {
            backend,
            registry,
            clock,
            settings: IngestionSettings::default(),
            state,
            active_run: Mutex::new(None),
        }
    }

    pub fn with_settings(mut self, settings: IngestionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &IngestionSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> IngestionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<IngestionSnapshot> {
        self.state.subscribe()
    }

    /// Remaining ingestion slots before the capacity limit is hit.
    pub fn remaining_capacity(&self) -> usize {
        self.settings
            .max_indexed
            .saturating_sub(self.registry.indexed_count())
    }

    /// Runs one ingestion to completion.
    ///
    /// Validation and capacity failures are raised before any remote call.
    /// A run that reaches `Indexed` or `Error` on the backend returns `Ok`
    /// with the terminal status; the caller inspects it.
    pub async fn execute(&self, repo_url: &str) -> Result<IngestionOutcome, IngestError> {
        let url = repo_url.trim();
        if url.is_empty() {
            return Err(IngestError::EmptyUrl);
        }

        let indexed = self.registry.indexed_count();
        if indexed >= self.settings.max_indexed {
            warn!(
                "Refusing to ingest {}: {} of {} repositories indexed",
                url, indexed, self.settings.max_indexed
            );
            return Err(CapacityError {
                indexed,
                limit: self.settings.max_indexed,
            }
            .into());
        }

        let started = self.state.send_if_modified(|snapshot| {
            if !snapshot.phase.is_idle() {
                return false;
            }
            *snapshot = IngestionSnapshot {
                phase: IngestionPhase::Submitting,
                ..IngestionSnapshot::idle()
            };
            true
        });
        if !started {
            return Err(IngestError::Busy);
        }

        let _reset = RunReset { use_case: self };
        let token = CancellationToken::new();
        *self.active_run() = Some(token.clone());

        let span = info_span!("ingest", run_id = %Uuid::new_v4(), url = %url);
        self.run(url, &token).instrument(span).await
    }

    /// Cancels the active run, if any. Returns `false` when idle.
    ///
    /// Only the local workflow stops; the backend keeps indexing.
    pub fn cancel(&self) -> bool {
        match self.active_run().as_ref() {
            Some(token) => {
                info!("Cancelling active ingestion");
                token.cancel();
                true
            }
            None => false,
        }
    }

    async fn run(&self, url: &str, token: &CancellationToken) -> Result<IngestionOutcome, IngestError> {
        info!("Submitting repository for ingestion");

        let submitted = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(IngestError::Cancelled),
            result = self.backend.ingest(url) => result,
        };
        let receipt = submitted.map_err(|e| self.reject(e))?;

        let repo_id = receipt.repo_id.clone();
        self.begin_polling(&receipt);
        if let Err(e) = self
            .registry
            .track(Repository::provisional(&repo_id, url, Some(receipt.message.clone())))
            .await
        {
            warn!("Failed to record provisional repository {}: {}", repo_id, e);
        }

        let status = self.poll_until_terminal(&repo_id, token).await?;
        info!("Ingestion of {} finished: {:?}", repo_id, status);
        self.state
            .send_modify(|s| s.phase = IngestionPhase::Finished(status));

        tokio::select! {
            biased;
            _ = token.cancelled() => return Err(IngestError::Cancelled),
            _ = self.clock.sleep(self.settings.grace_period) => {}
        }

        if let Err(e) = self.registry.refresh().await {
            warn!("Refresh after ingestion failed: {}", e);
        }

        Ok(IngestionOutcome {
            repo_id,
            status,
            log: self.state.borrow().log.clone(),
        })
    }

    fn reject(&self, error: DomainError) -> IngestError {
        let error = match error {
            DomainError::Api { detail, .. } | DomainError::NotFound(detail) => {
                IngestError::Rejected(detail)
            }
            other => IngestError::Transport(other),
        };
        warn!("Ingestion submission failed: {}", error);

        let message = error.to_string();
        self.state.send_modify(|s| {
            s.phase = IngestionPhase::Finished(TerminalStatus::Error);
            s.log.push(message);
        });
        error
    }

    fn begin_polling(&self, receipt: &IngestReceipt) {
        debug!("Backend accepted ingestion as {}", receipt.repo_id);
        self.state.send_modify(|s| {
            s.phase = IngestionPhase::Polling;
            s.repo_id = Some(receipt.repo_id.clone());
            s.progress = Some(0);
            if !receipt.message.trim().is_empty() {
                s.log.push(receipt.message.clone());
            }
        });
    }

    async fn poll_until_terminal(
        &self,
        repo_id: &str,
        token: &CancellationToken,
    ) -> Result<TerminalStatus, IngestError> {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(IngestError::Cancelled),
                _ = self.clock.sleep(self.settings.poll_interval) => {}
            }

            let listed = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(IngestError::Cancelled),
                result = self.backend.list() => result,
            };

            let repositories = match listed {
                Ok(repositories) => repositories,
                Err(e) => {
                    warn!("Status poll failed, retrying on next tick: {}", e);
                    continue;
                }
            };

            let Some(record) = repositories.into_iter().find(|r| r.id() == repo_id) else {
                debug!("Repository {} not listed yet", repo_id);
                continue;
            };
            let record = record.normalized();
            let terminal = TerminalStatus::from_status(record.status());

            self.state.send_modify(|s| {
                match record.status_message().filter(|m| !m.trim().is_empty()) {
                    Some(message) => {
                        s.log.push(message);
                    }
                    None => {
                        if let Some(status) = terminal {
                            s.log.push(status.default_message());
                        }
                    }
                }
                s.progress = record.progress();
            });

            if let Err(e) = self.registry.track(record).await {
                warn!("Failed to record polled status for {}: {}", repo_id, e);
            }

            if let Some(status) = terminal {
                return Ok(status);
            }
        }
    }

    fn active_run(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active_run
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Returns the workflow to `Idle` when a run ends, including when the
/// `execute` future is dropped mid-flight.
struct RunReset<'a> {
    use_case: &'a IngestRepositoryUseCase,
}

impl Drop for RunReset<'_> {
    fn drop(&mut self) {
        *self.use_case.active_run() = None;
        self.use_case.state.send_replace(IngestionSnapshot::idle());
    }
}
