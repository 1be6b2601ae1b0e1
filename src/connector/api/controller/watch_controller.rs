use std::future::Future;

use anyhow::Result;

use crate::Repository;

use super::super::Container;
use super::list_repositories_controller::format_repository_list;

pub struct WatchController<'a> {
    container: &'a Container,
}

impl<'a> WatchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Keeps the registry synced and prints every change until Ctrl-C.
    pub async fn watch(&self) -> Result<String> {
        self.watch_until(tokio::signal::ctrl_c()).await
    }

    async fn watch_until<F>(&self, stop: F) -> Result<String>
    where
        F: Future,
    {
        let registry = self.container.registry();
        let mut updates = registry.subscribe();
        let (token, handle) = self.container.start_registry_sync();

        println!("{}", self.render(&registry.get_all()));

        tokio::pin!(stop);
        loop {
            tokio::select! {
                _ = &mut stop => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let repos = updates.borrow_and_update().clone();
                    println!("{}", self.render(&repos));
                }
            }
        }

        token.cancel();
        handle.await?;
        Ok("Stopped watching.".to_string())
    }

    fn render(&self, repos: &[Repository]) -> String {
        let selected = self
            .container
            .selection()
            .resolve(&self.container.registry())
            .map(|r| r.id().to_string());
        format_repository_list(
            repos,
            selected.as_deref(),
            self.container.ingest_use_case().settings().max_indexed,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::oneshot;

    use super::*;
    use crate::connector::api::ContainerConfig;
    use crate::connector::{InMemoryStore, ManualClock, MockBackend};

    fn container(backend: Arc<MockBackend>) -> Container {
        Container::with_parts(
            ContainerConfig::default(),
            backend.clone(),
            backend,
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualClock::new()),
        )
    }

    #[tokio::test]
    async fn test_render_marks_active_repository() {
        let repo = Repository::provisional("r1", "https://github.com/acme/r1", None);
        let backend = Arc::new(MockBackend::with_repositories(vec![repo]));
        let container = container(backend);
        container.registry().refresh().await.unwrap();
        container
            .selection()
            .select_by_id(&container.registry(), "r1")
            .unwrap();

        let output = WatchController::new(&container).render(&container.registry().get_all());

        assert!(output.contains("* r1"), "unexpected output: {output}");
    }

    #[tokio::test]
    async fn test_watch_stops_on_signal() {
        let backend = Arc::new(MockBackend::new());
        let container = container(backend.clone());
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let controller = WatchController::new(&container);
        let watching = controller.watch_until(stop_rx);
        tokio::pin!(watching);

        tokio::select! {
            _ = &mut watching => panic!("watch ended before the stop signal"),
            _ = tokio::task::yield_now() => {}
        }
        stop_tx.send(()).unwrap();

        assert_eq!(watching.await.unwrap(), "Stopped watching.");
        assert!(!container.is_shut_down());
    }
}
