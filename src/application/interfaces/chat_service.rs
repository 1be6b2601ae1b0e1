use async_trait::async_trait;

use crate::domain::{Answer, ChatQuery, DomainError};

/// Sends a single question to the code assistant and returns its answer.
///
/// Implementors encapsulate transport and serialization; the chat pipeline
/// stays decoupled from any particular HTTP client library.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn ask(&self, query: &ChatQuery) -> Result<Answer, DomainError>;
}
