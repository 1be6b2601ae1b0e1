use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::application::{ChatService, IngestReceipt, RepositoryBackend};
use crate::domain::{
    name_from_url, Answer, ChatQuery, DomainError, Repository, RepositoryStatus,
};

/// Stage messages reported while a simulated ingestion advances.
const STAGES: &[(u8, &str)] = &[
    (20, "Cloning repository..."),
    (40, "Reading files..."),
    (60, "Chunking documents..."),
    (85, "Generating embeddings..."),
];

#[derive(Default)]
struct MockState {
    repositories: Vec<Repository>,
    list_script: VecDeque<Result<Vec<Repository>, DomainError>>,
    ingest_response: Option<Result<IngestReceipt, DomainError>>,
    chat_response: Option<Result<Answer, DomainError>>,
    last_chat_query: Option<ChatQuery>,
    next_id: usize,
}

/// In-process stand-in for the indexing backend.
///
/// Without scripting it behaves like a small backend: `ingest` registers an
/// `Indexing` record and every `list` call advances it one stage until it is
/// `Indexed`. Tests can queue exact `list` responses, override the ingest and
/// chat replies, and read per-endpoint call counts.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    list_calls: AtomicUsize,
    ingest_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    clear_calls: AtomicUsize,
    chat_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repositories(repositories: Vec<Repository>) -> Self {
        let backend = Self::default();
        backend.set_repositories(repositories);
        backend
    }

    pub fn set_repositories(&self, repositories: Vec<Repository>) {
        self.state().repositories = repositories;
    }

    pub fn repositories(&self) -> Vec<Repository> {
        self.state().repositories.clone()
    }

    /// Queues the reply for a future `list` call, ahead of the simulation.
    pub fn push_list_response(&self, response: Result<Vec<Repository>, DomainError>) {
        self.state().list_script.push_back(response);
    }

    /// Overrides the reply of the next `ingest` call only.
    pub fn set_ingest_response(&self, response: Result<IngestReceipt, DomainError>) {
        self.state().ingest_response = Some(response);
    }

    /// Overrides the reply of the next `ask` call only.
    pub fn set_chat_response(&self, response: Result<Answer, DomainError>) {
        self.state().chat_response = Some(response);
    }

    pub fn last_chat_query(&self) -> Option<ChatQuery> {
        self.state().last_chat_query.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn ingest_calls(&self) -> usize {
        self.ingest_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    /// Total number of remote calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.list_calls()
            + self.ingest_calls()
            + self.delete_calls()
            + self.clear_calls()
            + self.chat_calls()
    }

    pub fn reset_counts(&self) {
        for counter in [
            &self.list_calls,
            &self.ingest_calls,
            &self.delete_calls,
            &self.clear_calls,
            &self.chat_calls,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn advance(repository: &Repository) -> Repository {
        let current = repository.progress().unwrap_or(0);
        let next = STAGES.iter().find(|(progress, _)| *progress > current);

        let (status, progress, message, last_synced) = match next {
            Some((progress, message)) => (
                RepositoryStatus::Indexing,
                Some(*progress),
                Some(message.to_string()),
                repository.last_synced().to_string(),
            ),
            None => (
                RepositoryStatus::Indexed,
                None,
                Some("Indexing complete".to_string()),
                "Just now".to_string(),
            ),
        };

        Repository::reconstitute(
            repository.id().to_string(),
            repository.name().to_string(),
            repository.url().to_string(),
            status,
            message,
            progress,
            repository.branch().to_string(),
            repository.language().to_string(),
            last_synced,
        )
    }
}

#[async_trait]
impl RepositoryBackend for MockBackend {
    async fn list(&self) -> Result<Vec<Repository>, DomainError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();

        if let Some(scripted) = state.list_script.pop_front() {
            if let Ok(repositories) = &scripted {
                state.repositories = repositories.clone();
            }
            return scripted;
        }

        state.repositories = state
            .repositories
            .iter()
            .map(|r| {
                if r.status().is_in_progress() {
                    Self::advance(r)
                } else {
                    r.clone()
                }
            })
            .collect();
        Ok(state.repositories.clone())
    }

    async fn ingest(&self, repo_url: &str) -> Result<IngestReceipt, DomainError> {
        self.ingest_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();

        if let Some(response) = state.ingest_response.take() {
            return response;
        }

        state.next_id += 1;
        let repo_id = format!("repo_{}", state.next_id);
        let name = name_from_url(repo_url);
        debug!("Mock backend accepted {} as {}", repo_url, repo_id);

        state
            .repositories
            .push(Repository::provisional(&repo_id, repo_url, None));
        Ok(IngestReceipt {
            repo_id,
            message: format!("Started ingesting repository: {}", name),
            status: Some("success".to_string()),
        })
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();

        let before = state.repositories.len();
        state.repositories.retain(|r| r.id() != id);
        if state.repositories.len() == before {
            return Err(DomainError::not_found(format!("Repository not found: {}", id)));
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), DomainError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.state().repositories.clear();
        Ok(())
    }

    async fn health(&self) -> Result<String, DomainError> {
        Ok("ok".to_string())
    }
}

#[async_trait]
impl ChatService for MockBackend {
    async fn ask(&self, query: &ChatQuery) -> Result<Answer, DomainError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.last_chat_query = Some(query.clone());

        if let Some(response) = state.chat_response.take() {
            return response;
        }

        let scope = query.repo_name.as_deref().unwrap_or("all repositories");
        Ok(Answer::new(format!(
            "Mock answer about {}: {}",
            scope, query.query
        )))
    }
}
