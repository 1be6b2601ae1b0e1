use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{
    AskController, DeleteController, HealthController, IngestController,
    ListRepositoriesController, SelectionController, WatchController,
};

pub struct Router<'a> {
    list_repositories_controller: ListRepositoriesController<'a>,
    watch_controller: WatchController<'a>,
    ingest_controller: IngestController<'a>,
    selection_controller: SelectionController<'a>,
    ask_controller: AskController<'a>,
    delete_controller: DeleteController<'a>,
    health_controller: HealthController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            list_repositories_controller: ListRepositoriesController::new(container),
            watch_controller: WatchController::new(container),
            ingest_controller: IngestController::new(container),
            selection_controller: SelectionController::new(container),
            ask_controller: AskController::new(container),
            delete_controller: DeleteController::new(container),
            health_controller: HealthController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::List => self.list_repositories_controller.list().await,
            Commands::Watch => self.watch_controller.watch().await,
            Commands::Ingest { url } => self.ingest_controller.ingest(url).await,
            Commands::Select { id } => self.selection_controller.select(id).await,
            Commands::Selected => self.selection_controller.selected(),
            Commands::Unselect => self.selection_controller.unselect(),
            Commands::Ask { query } => self.ask_controller.ask(query.join(" ")).await,
            Commands::Remove { id } => self.delete_controller.remove(id).await,
            Commands::ClearAll => self.delete_controller.clear_all().await,
            Commands::Health => self.health_controller.health().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connector::api::ContainerConfig;
    use crate::connector::{InMemoryStore, ManualClock, MockBackend};
    use crate::Repository;

    fn container(backend: Arc<MockBackend>) -> Container {
        Container::with_parts(
            ContainerConfig::default(),
            backend.clone(),
            backend,
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualClock::new()),
        )
    }

    fn indexed(id: &str) -> Repository {
        Repository::provisional(id, format!("https://github.com/acme/{id}"), None)
    }

    #[tokio::test]
    async fn test_list_with_no_repositories() {
        let backend = Arc::new(MockBackend::new());
        let container = container(backend);

        let output = Router::new(&container).route(Commands::List).await.unwrap();

        assert_eq!(output, "No repositories connected.");
    }

    #[tokio::test]
    async fn test_select_then_selected() {
        let backend = Arc::new(MockBackend::with_repositories(vec![indexed("r1")]));
        let container = container(backend);
        let router = Router::new(&container);

        router
            .route(Commands::Select { id: "r1".to_string() })
            .await
            .unwrap();
        let output = router.route(Commands::Selected).await.unwrap();

        assert!(output.contains("(r1)"));
    }

    #[tokio::test]
    async fn test_select_unknown_id_fails() {
        let backend = Arc::new(MockBackend::new());
        let container = container(backend);

        let result = Router::new(&container)
            .route(Commands::Select { id: "missing".to_string() })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ask_joins_words() {
        let backend = Arc::new(MockBackend::new());
        let container = container(backend.clone());

        let output = Router::new(&container)
            .route(Commands::Ask {
                query: vec!["what".to_string(), "is".to_string(), "this?".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(output, "Mock answer about all repositories: what is this?");
        assert_eq!(backend.chat_calls(), 1);
    }

    #[tokio::test]
    async fn test_remove_unknown_reports_not_found() {
        let backend = Arc::new(MockBackend::new());
        let container = container(backend);

        let output = Router::new(&container)
            .route(Commands::Remove { id: "nope".to_string() })
            .await
            .unwrap();

        assert_eq!(output, "Repository nope not found.");
    }
}
