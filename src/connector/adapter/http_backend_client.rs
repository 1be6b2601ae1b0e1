use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::{ChatService, IngestReceipt, RepositoryBackend};
use crate::domain::{Answer, ChatQuery, DomainError, Repository};

/// Default target: the backend running locally on its standard port.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct IngestRequest<'a> {
    repo_url: &'a str,
}

/// Error payload shape used by the backend for non-2xx replies.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

/// HTTP client for the indexing backend.
///
/// Implements both [`RepositoryBackend`] and [`ChatService`] so the registry,
/// ingestion workflow and chat pipeline stay decoupled from transport and
/// serialization details. All paths are relative to the API base URL
/// (`/repos`, `/ingest`, `/chat`, ...); the health probe lives at the server
/// root, i.e. the base URL without a trailing `/api`.
pub struct HttpBackendClient {
    client: reqwest::Client,
    /// API base without trailing slash (e.g. `http://127.0.0.1:8000/api`).
    api_url: String,
    /// Server root used for `/health`.
    root_url: String,
}

impl HttpBackendClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let api_url: String = api_url.into();
        let api_url = api_url.trim_end_matches('/').to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(DomainError::invalid_input(format!(
                "API URL must start with http:// or https://: {}",
                api_url
            )));
        }
        let root_url = api_url
            .strip_suffix("/api")
            .unwrap_or(&api_url)
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url,
            root_url,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Response, DomainError> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::transport(format!("{what}: request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("{what}: backend returned {status}: {body}");
        let detail = extract_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

        if status == StatusCode::NOT_FOUND {
            return Err(DomainError::not_found(detail));
        }
        Err(DomainError::api(status.as_u16(), detail))
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, DomainError> {
        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::decode(format!("{what}: failed to parse response: {e}")))
    }
}

/// Pulls a human-readable `detail` out of an error body, if present.
fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(detail) => Some(detail),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl RepositoryBackend for HttpBackendClient {
    async fn list(&self) -> Result<Vec<Repository>, DomainError> {
        let request = self.client.get(self.endpoint("/repos"));
        let response = self.send(request, "list repositories").await?;
        let repositories: Vec<Repository> = Self::decode(response, "list repositories").await?;
        debug!("Backend listed {} repositories", repositories.len());
        Ok(repositories.into_iter().map(Repository::normalized).collect())
    }

    async fn ingest(&self, repo_url: &str) -> Result<IngestReceipt, DomainError> {
        let request = self
            .client
            .post(self.endpoint("/ingest"))
            .json(&IngestRequest { repo_url });
        let response = self.send(request, "ingest").await?;
        Self::decode(response, "ingest").await
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let request = self.client.delete(self.endpoint(&format!("/repos/{id}")));
        self.send(request, "delete repository").await?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), DomainError> {
        let request = self.client.post(self.endpoint("/repos/clear-all"));
        self.send(request, "clear repositories").await?;
        Ok(())
    }

    async fn health(&self) -> Result<String, DomainError> {
        let request = self.client.get(format!("{}/health", self.root_url));
        let response = self.send(request, "health").await?;
        let body: HealthBody = Self::decode(response, "health").await?;
        Ok(body.status)
    }
}

#[async_trait]
impl ChatService for HttpBackendClient {
    async fn ask(&self, query: &ChatQuery) -> Result<Answer, DomainError> {
        let request = self.client.post(self.endpoint("/chat")).json(query);
        let response = self.send(request, "chat").await?;
        Self::decode(response, "chat").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_detail_reads_string_detail() {
        let body = r#"{"detail": "Error starting ingestion: invalid url"}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("Error starting ingestion: invalid url")
        );
    }

    #[test]
    fn extract_detail_stringifies_structured_detail() {
        let body = r#"{"detail": [{"loc": ["body", "repo_url"], "msg": "field required"}]}"#;
        let detail = extract_detail(body).unwrap();
        assert!(detail.contains("field required"));
    }

    #[test]
    fn extract_detail_ignores_non_json() {
        assert_eq!(extract_detail("<html>502</html>"), None);
    }

    #[test]
    fn root_url_strips_api_suffix() {
        let client = HttpBackendClient::new("http://localhost:8000/api/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.api_url(), "http://localhost:8000/api");
        assert_eq!(client.root_url, "http://localhost:8000");
    }

    #[test]
    fn rejects_non_http_url() {
        assert!(HttpBackendClient::new("localhost:8000", DEFAULT_TIMEOUT).is_err());
    }
}
