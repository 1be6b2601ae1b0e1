use anyhow::Result;
use tracing::warn;

use crate::Repository;

use super::super::Container;

pub struct ListRepositoriesController<'a> {
    container: &'a Container,
}

impl<'a> ListRepositoriesController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Refreshes, then lists. Falls back to the cached list when offline.
    pub async fn list(&self) -> Result<String> {
        let registry = self.container.registry();
        let mut output = String::new();

        if let Err(e) = registry.refresh().await {
            warn!("{}", e);
            output.push_str("(offline: showing last synced list)\n\n");
        }

        let selected = self
            .container
            .selection()
            .resolve(&registry)
            .map(|r| r.id().to_string());
        output.push_str(&format_repository_list(
            &registry.get_all(),
            selected.as_deref(),
            self.container.ingest_use_case().settings().max_indexed,
        ));
        Ok(output)
    }
}

pub(crate) fn format_repository_list(
    repos: &[Repository],
    selected: Option<&str>,
    limit: usize,
) -> String {
    if repos.is_empty() {
        return "No repositories connected.".to_string();
    }

    let indexed = repos.iter().filter(|r| r.is_indexed()).count();
    let mut output = format!("Repositories ({}/{} indexed):\n\n", indexed, limit);
    for repo in repos {
        let marker = if Some(repo.id()) == selected { "*" } else { " " };
        output.push_str(&format!("{} {} ({})\n", marker, repo.summary(), repo.id()));
        output.push_str(&format!("    URL: {}\n", repo.url()));
        output.push_str(&format!(
            "    Branch: {}, Language: {}, Last synced: {}\n",
            display_or_dash(repo.branch()),
            display_or_dash(repo.language()),
            display_or_dash(repo.last_synced())
        ));
        if let Some(message) = repo.status_message() {
            output.push_str(&format!("    Status: {}\n", message));
        }
        output.push('\n');
    }

    output
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
