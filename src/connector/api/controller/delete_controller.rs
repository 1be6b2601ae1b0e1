use anyhow::Result;

use crate::{DomainError, SyncError};

use super::super::Container;

pub struct DeleteController<'a> {
    container: &'a Container,
}

impl<'a> DeleteController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn remove(&self, id: String) -> Result<String> {
        match self.container.registry().remove(&id).await {
            Ok(()) => Ok("Repository removed.".to_string()),
            Err(SyncError::Remote(DomainError::NotFound(_))) => {
                Ok(format!("Repository {} not found.", id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn clear_all(&self) -> Result<String> {
        self.container.registry().clear_all().await?;
        Ok("All repositories cleared.".to_string())
    }
}
