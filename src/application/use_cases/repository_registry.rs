use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::application::{
    load_json, save_json, KeyValueStore, RepositoryBackend, REPOSITORIES_KEY,
};
use crate::domain::{indexed_count, Repository, SyncError};

/// In-memory list of repositories for the current session.
///
/// Hydrated from the persisted snapshot on construction and refreshed from the
/// backend. Every write persists the snapshot before publishing the new list,
/// and both happen under one lock so the store and the in-memory view never
/// diverge. Subscribers are notified through a watch channel.
pub struct RepositoryRegistry {
    backend: Arc<dyn RepositoryBackend>,
    store: Arc<dyn KeyValueStore>,
    repositories: watch::Sender<Vec<Repository>>,
    write_lock: Mutex<()>,
}

impl RepositoryRegistry {
    pub fn new(backend: Arc<dyn RepositoryBackend>, store: Arc<dyn KeyValueStore>) -> Self {
        let cached = load_json::<Vec<Repository>>(store.as_ref(), REPOSITORIES_KEY)
            .map(dedupe)
            .unwrap_or_default();
        debug!("Hydrated {} repositories from local snapshot", cached.len());

        let (repositories, _) = watch::channel(cached);
        Self {
            backend,
            store,
            repositories,
            write_lock: Mutex::new(()),
        }
    }

    pub fn get_all(&self) -> Vec<Repository> {
        self.repositories.borrow().clone()
    }

    pub fn get(&self, id: &str) -> Option<Repository> {
        self.repositories
            .borrow()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.repositories.borrow().iter().any(|r| r.id() == id)
    }

    pub fn indexed_count(&self) -> usize {
        indexed_count(&self.repositories.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Repository>> {
        self.repositories.subscribe()
    }

    /// Replaces the list with the backend's current view.
    ///
    /// On failure the previous list and snapshot are left untouched.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        let fetched = self.backend.list().await.map_err(SyncError::Remote)?;
        let repositories = dedupe(fetched);
        self.replace(repositories).await
    }

    pub async fn clear_all(&self) -> Result<(), SyncError> {
        info!("Clearing all repositories");
        self.backend.clear_all().await.map_err(SyncError::Remote)?;
        self.refresh().await
    }

    pub async fn remove(&self, id: &str) -> Result<(), SyncError> {
        info!("Removing repository: {}", id);
        self.backend.delete(id).await.map_err(SyncError::Remote)?;
        self.refresh().await
    }

    /// Inserts or replaces a single record by id, keeping list order.
    pub async fn track(&self, record: Repository) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().await;

        let mut repositories = self.get_all();
        match repositories.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => *slot = record,
            None => repositories.push(record),
        }

        self.persist_and_publish(repositories)
    }

    async fn replace(&self, repositories: Vec<Repository>) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().await;
        self.persist_and_publish(repositories)
    }

    fn persist_and_publish(&self, repositories: Vec<Repository>) -> Result<(), SyncError> {
        save_json(self.store.as_ref(), REPOSITORIES_KEY, &repositories)
            .map_err(SyncError::Persist)?;
        debug!("Registry now holds {} repositories", repositories.len());
        self.repositories.send_replace(repositories);
        Ok(())
    }
}

/// Normalizes records and keeps only the first occurrence of each id.
fn dedupe(repositories: Vec<Repository>) -> Vec<Repository> {
    let mut seen = HashSet::new();
    repositories
        .into_iter()
        .map(Repository::normalized)
        .filter(|r| {
            let fresh = seen.insert(r.id().to_string());
            if !fresh {
                warn!("Dropping duplicate repository id from listing: {}", r.id());
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{InMemoryStore, MockBackend};
    use crate::domain::{DomainError, RepositoryStatus};

    fn repo(id: &str, status: RepositoryStatus) -> Repository {
        Repository::reconstitute(
            id.to_string(),
            format!("repo-{id}"),
            format!("https://github.com/acme/{id}"),
            status,
            None,
            None,
            "main".to_string(),
            "Rust".to_string(),
            "Just now".to_string(),
        )
    }

    #[tokio::test]
    async fn test_refresh_replaces_list_and_snapshot() {
        let backend = Arc::new(MockBackend::with_repositories(vec![
            repo("1", RepositoryStatus::Indexed),
            repo("2", RepositoryStatus::Indexing),
        ]));
        let store = Arc::new(InMemoryStore::new());
        let registry = RepositoryRegistry::new(backend.clone(), store.clone());

        registry.refresh().await.unwrap();

        let ids: Vec<_> = registry.get_all().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(registry.indexed_count(), 1);

        let persisted: Vec<Repository> = load_json(store.as_ref(), REPOSITORIES_KEY).unwrap();
        assert_eq!(persisted, registry.get_all());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_state() {
        let backend = Arc::new(MockBackend::with_repositories(vec![repo(
            "1",
            RepositoryStatus::Indexed,
        )]));
        let store = Arc::new(InMemoryStore::new());
        let registry = RepositoryRegistry::new(backend.clone(), store.clone());
        registry.refresh().await.unwrap();

        backend.push_list_response(Err(DomainError::transport("connection refused")));
        let result = registry.refresh().await;

        assert!(matches!(result, Err(SyncError::Remote(_))));
        assert_eq!(registry.get_all().len(), 1);
        let persisted: Vec<Repository> = load_json(store.as_ref(), REPOSITORIES_KEY).unwrap();
        assert_eq!(persisted.len(), 1);
    }

    #[tokio::test]
    async fn test_hydrates_from_snapshot() {
        let store = Arc::new(InMemoryStore::new());
        save_json(
            store.as_ref(),
            REPOSITORIES_KEY,
            &vec![repo("cached", RepositoryStatus::Indexed)],
        )
        .unwrap();

        let registry = RepositoryRegistry::new(Arc::new(MockBackend::new()), store);

        assert!(registry.contains("cached"));
        assert_eq!(registry.indexed_count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_hydrates_empty() {
        let store = Arc::new(InMemoryStore::new());
        store.save(REPOSITORIES_KEY, "{not json").unwrap();

        let registry = RepositoryRegistry::new(Arc::new(MockBackend::new()), store);

        assert!(registry.get_all().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_first() {
        let shadow = Repository::reconstitute(
            "1".to_string(),
            "shadow".to_string(),
            "https://github.com/acme/shadow".to_string(),
            RepositoryStatus::Error,
            None,
            None,
            String::new(),
            String::new(),
            String::new(),
        );
        let backend = Arc::new(MockBackend::with_repositories(vec![
            repo("1", RepositoryStatus::Indexed),
            shadow,
        ]));
        let registry = RepositoryRegistry::new(backend, Arc::new(InMemoryStore::new()));

        registry.refresh().await.unwrap();

        let all = registry.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name(), "repo-1");
    }

    #[tokio::test]
    async fn test_clear_all_then_refresh_is_empty() {
        let backend = Arc::new(MockBackend::with_repositories(vec![
            repo("1", RepositoryStatus::Indexed),
            repo("2", RepositoryStatus::Indexed),
        ]));
        let registry = RepositoryRegistry::new(backend.clone(), Arc::new(InMemoryStore::new()));
        registry.refresh().await.unwrap();

        registry.clear_all().await.unwrap();
        registry.refresh().await.unwrap();

        assert!(registry.get_all().is_empty());
        assert_eq!(backend.clear_calls(), 1);
    }

    #[tokio::test]
    async fn test_remove_single_repository() {
        let backend = Arc::new(MockBackend::with_repositories(vec![
            repo("1", RepositoryStatus::Indexed),
            repo("2", RepositoryStatus::Indexed),
        ]));
        let registry = RepositoryRegistry::new(backend, Arc::new(InMemoryStore::new()));
        registry.refresh().await.unwrap();

        registry.remove("1").await.unwrap();

        assert!(!registry.contains("1"));
        assert!(registry.contains("2"));
    }

    #[tokio::test]
    async fn test_track_upserts_and_notifies() {
        let registry =
            RepositoryRegistry::new(Arc::new(MockBackend::new()), Arc::new(InMemoryStore::new()));
        let mut updates = registry.subscribe();

        registry
            .track(Repository::provisional("r1", "https://github.com/a/b", None))
            .await
            .unwrap();
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().len(), 1);

        registry.track(repo("r1", RepositoryStatus::Indexed)).await.unwrap();
        assert_eq!(registry.get_all().len(), 1);
        assert_eq!(registry.indexed_count(), 1);
    }
}
