use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Repository};

/// Acknowledgement returned when the backend accepts an ingestion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub repo_id: String,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Remote source of truth for repository records.
#[async_trait]
pub trait RepositoryBackend: Send + Sync {
    /// Full, ordered list of repositories known to the backend.
    async fn list(&self) -> Result<Vec<Repository>, DomainError>;

    async fn ingest(&self, repo_url: &str) -> Result<IngestReceipt, DomainError>;

    async fn delete(&self, id: &str) -> Result<(), DomainError>;

    async fn clear_all(&self) -> Result<(), DomainError>;

    async fn health(&self) -> Result<String, DomainError>;
}
