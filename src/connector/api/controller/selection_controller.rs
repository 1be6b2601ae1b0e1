use anyhow::Result;

use super::super::Container;

pub struct SelectionController<'a> {
    container: &'a Container,
}

impl<'a> SelectionController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn select(&self, id: String) -> Result<String> {
        let registry = self.container.registry();
        if !registry.contains(&id) {
            registry.refresh().await?;
        }

        let repo = self.container.selection().select_by_id(&registry, &id)?;
        Ok(format!("Active repository: {} ({})", repo.name(), repo.id()))
    }

    pub fn selected(&self) -> Result<String> {
        let registry = self.container.registry();
        let selection = self.container.selection();

        Ok(match (selection.get_selected(), selection.resolve(&registry)) {
            (None, _) => "No active repository.".to_string(),
            (Some(repo), Some(_)) => format!("Active repository: {} ({})", repo.name(), repo.id()),
            (Some(repo), None) => format!(
                "Active repository {} ({}) is no longer connected.",
                repo.name(),
                repo.id()
            ),
        })
    }

    pub fn unselect(&self) -> Result<String> {
        self.container.selection().clear()?;
        Ok("Active repository cleared.".to_string())
    }
}
