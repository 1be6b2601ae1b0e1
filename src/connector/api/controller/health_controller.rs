use anyhow::Result;

use super::super::Container;

pub struct HealthController<'a> {
    container: &'a Container,
}

impl<'a> HealthController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn health(&self) -> Result<String> {
        let status = self.container.backend().health().await?;
        let target = if self.container.mock_backend() {
            "mock backend"
        } else {
            self.container.api_url()
        };
        Ok(format!("Backend {}: {}\nData Dir: {}", target, status, self.container.data_dir()))
    }
}
