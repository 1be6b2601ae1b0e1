use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{IngestionOutcome, IngestionPhase, TerminalStatus};

use super::super::Container;

pub struct IngestController<'a> {
    container: &'a Container,
}

impl<'a> IngestController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Submits `url` and renders progress until the run finishes.
    /// Ctrl-C cancels the local run.
    pub async fn ingest(&self, url: String) -> Result<String> {
        self.ingest_until(url, tokio::signal::ctrl_c()).await
    }

    /// Like [`Self::ingest`], cancelling the run once `interrupt` resolves.
    async fn ingest_until<F>(&self, url: String, interrupt: F) -> Result<String>
    where
        F: Future,
    {
        let registry = self.container.registry();
        if let Err(e) = registry.refresh().await {
            tracing::warn!("Using cached repository list for capacity check: {}", e);
        }

        let use_case = self.container.ingest_use_case();
        let mut updates = use_case.subscribe();

        let progress_bar = ProgressBar::new(100);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
                .progress_chars("#>-"),
        );
        progress_bar.enable_steady_tick(Duration::from_millis(120));

        let run = use_case.execute(&url);
        tokio::pin!(run);
        tokio::pin!(interrupt);
        let mut interrupted = false;

        let result = loop {
            tokio::select! {
                biased;
                result = &mut run => break result,
                _ = &mut interrupt, if !interrupted => {
                    interrupted = true;
                    use_case.cancel();
                }
                Ok(()) = updates.changed() => {
                    let snapshot = updates.borrow_and_update().clone();
                    if let Some(progress) = snapshot.progress {
                        progress_bar.set_position(u64::from(progress));
                    }
                    if let Some(message) = snapshot.log.last() {
                        progress_bar.set_message(message.to_string());
                    }
                    if matches!(snapshot.phase, IngestionPhase::Finished(TerminalStatus::Indexed)) {
                        progress_bar.set_position(100);
                    }
                }
            }
        };
        progress_bar.finish_and_clear();

        Ok(format_outcome(&result?))
    }
}

fn format_outcome(outcome: &IngestionOutcome) -> String {
    let headline = match outcome.status {
        TerminalStatus::Indexed => format!("Successfully indexed repository: {}", outcome.repo_id),
        TerminalStatus::Error => format!("Indexing failed for repository: {}", outcome.repo_id),
    };

    let mut output = headline;
    for entry in outcome.log.entries() {
        output.push_str(&format!("\n  - {}", entry));
    }
    output
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connector::api::ContainerConfig;
    use crate::connector::{InMemoryStore, ManualClock, MockBackend};
    use crate::IngestError;

    #[tokio::test]
    async fn test_interrupt_cancels_run() {
        let backend = Arc::new(MockBackend::new());
        let container = Container::with_parts(
            ContainerConfig::default(),
            backend.clone(),
            backend.clone(),
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualClock::new()),
        );

        let result = IngestController::new(&container)
            .ingest_until(
                "https://github.com/acme/slow".to_string(),
                std::future::ready(()),
            )
            .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::Cancelled)
        ));
        assert!(container.ingest_use_case().snapshot().phase.is_idle());
    }
}
