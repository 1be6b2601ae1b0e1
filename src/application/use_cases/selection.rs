use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::application::{
    load_json, save_json, KeyValueStore, RepositoryRegistry, SELECTED_REPOSITORY_KEY,
};
use crate::domain::{DomainError, Repository};

/// Holds the single active repository that scopes chat.
///
/// The full record snapshot is persisted so the selection survives restarts.
/// Registry membership is checked only at point of use via [`Self::resolve`].
pub struct SelectionManager {
    store: Arc<dyn KeyValueStore>,
    selected: watch::Sender<Option<Repository>>,
}

impl SelectionManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let hydrated = load_json::<Repository>(store.as_ref(), SELECTED_REPOSITORY_KEY)
            .map(Repository::normalized);
        if let Some(repo) = &hydrated {
            debug!("Restored selected repository {}", repo.id());
        }

        let (selected, _) = watch::channel(hydrated);
        Self { store, selected }
    }

    pub fn get_selected(&self) -> Option<Repository> {
        self.selected.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Repository>> {
        self.selected.subscribe()
    }

    pub fn select(&self, repository: Repository) -> Result<(), DomainError> {
        save_json(self.store.as_ref(), SELECTED_REPOSITORY_KEY, &repository)?;
        info!("Selected repository {} ({})", repository.name(), repository.id());
        self.selected.send_replace(Some(repository));
        Ok(())
    }

    /// Selects the registry's current record for `id`.
    pub fn select_by_id(
        &self,
        registry: &RepositoryRegistry,
        id: &str,
    ) -> Result<Repository, DomainError> {
        let repository = registry
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("Repository not found: {}", id)))?;
        self.select(repository.clone())?;
        Ok(repository)
    }

    pub fn clear(&self) -> Result<(), DomainError> {
        self.store.delete(SELECTED_REPOSITORY_KEY)?;
        self.selected.send_replace(None);
        Ok(())
    }

    /// The selection, if its id is still present in the registry.
    ///
    /// The stored snapshot is returned as-is even when the registry's copy
    /// has different fields; a vanished id makes the selection absent.
    pub fn resolve(&self, registry: &RepositoryRegistry) -> Option<Repository> {
        let selected = self.get_selected()?;
        if registry.contains(selected.id()) {
            Some(selected)
        } else {
            debug!("Selected repository {} is no longer registered", selected.id());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{InMemoryStore, MockBackend};
    use crate::domain::RepositoryStatus;

    fn repo(id: &str, name: &str) -> Repository {
        Repository::reconstitute(
            id.to_string(),
            name.to_string(),
            format!("https://github.com/acme/{name}"),
            RepositoryStatus::Indexed,
            Some("done".to_string()),
            None,
            "main".to_string(),
            "Go".to_string(),
            "2025-01-01 10:00:00".to_string(),
        )
    }

    #[test]
    fn test_selection_survives_restart() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let original = repo("r1", "api");

        SelectionManager::new(store.clone()).select(original.clone()).unwrap();
        let reloaded = SelectionManager::new(store);

        assert_eq!(reloaded.get_selected(), Some(original));
    }

    #[test]
    fn test_clear_removes_persisted_entry() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let manager = SelectionManager::new(store.clone());
        manager.select(repo("r1", "api")).unwrap();

        manager.clear().unwrap();

        assert_eq!(manager.get_selected(), None);
        assert_eq!(store.load(SELECTED_REPOSITORY_KEY), None);
        assert_eq!(SelectionManager::new(store).get_selected(), None);
    }

    #[test]
    fn test_corrupt_selection_is_absent() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        store.save(SELECTED_REPOSITORY_KEY, "[1, 2").unwrap();

        assert_eq!(SelectionManager::new(store).get_selected(), None);
    }

    #[tokio::test]
    async fn test_resolve_checks_registry_membership() {
        let backend = Arc::new(MockBackend::with_repositories(vec![repo("r1", "renamed")]));
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let registry = RepositoryRegistry::new(backend.clone(), store.clone());
        registry.refresh().await.unwrap();

        let manager = SelectionManager::new(store);
        manager.select(repo("r1", "api")).unwrap();

        // Snapshot stays authoritative while the id is registered.
        assert_eq!(manager.resolve(&registry).map(|r| r.name().to_string()), Some("api".to_string()));

        registry.clear_all().await.unwrap();
        assert_eq!(manager.resolve(&registry), None);
        assert!(manager.get_selected().is_some());
    }

    #[tokio::test]
    async fn test_select_by_id_requires_registered_repository() {
        let backend = Arc::new(MockBackend::with_repositories(vec![repo("r1", "api")]));
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let registry = RepositoryRegistry::new(backend, store.clone());
        registry.refresh().await.unwrap();
        let manager = SelectionManager::new(store);

        assert!(manager.select_by_id(&registry, "missing").unwrap_err().is_not_found());
        assert_eq!(manager.select_by_id(&registry, "r1").unwrap().name(), "api");
        assert_eq!(manager.get_selected().unwrap().id(), "r1");
    }
}
