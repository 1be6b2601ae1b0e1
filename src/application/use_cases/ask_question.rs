use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::ChatService;
use crate::domain::{Answer, ChatError, ChatMessage, ChatQuery, ChatTranscript, Repository};

/// One-shot question/answer exchange with the code assistant.
pub struct AskQuestionUseCase {
    chat_service: Arc<dyn ChatService>,
}

impl AskQuestionUseCase {
    pub fn new(chat_service: Arc<dyn ChatService>) -> Self {
        Self { chat_service }
    }

    /// Empty queries are rejected locally. Remote failures degrade to
    /// [`ChatError::Unavailable`], which carries the user-facing fallback.
    pub async fn execute(
        &self,
        query: &str,
        context: Option<&Repository>,
    ) -> Result<Answer, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }

        debug!(
            "Asking: {} (repository={})",
            query,
            context.map(|r| r.id()).unwrap_or("none")
        );

        let request = ChatQuery::new(query, context);
        self.chat_service.ask(&request).await.map_err(|e| {
            warn!("Chat request failed: {}", e);
            ChatError::unavailable(e)
        })
    }
}

/// A conversation: the pipeline plus its running transcript.
pub struct ChatSession {
    use_case: AskQuestionUseCase,
    transcript: ChatTranscript,
}

impl ChatSession {
    pub fn new(use_case: AskQuestionUseCase) -> Self {
        Self {
            use_case,
            transcript: ChatTranscript::new(),
        }
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    /// Sends a message and records the exchange.
    ///
    /// An empty query leaves the transcript untouched; a failed request
    /// records the fallback text as the assistant's reply.
    pub async fn send(
        &mut self,
        query: &str,
        context: Option<&Repository>,
    ) -> Result<Answer, ChatError> {
        let result = self.use_case.execute(query, context).await;

        match &result {
            Ok(answer) => {
                self.transcript.push(ChatMessage::user(query.trim()));
                self.transcript.push(ChatMessage::assistant(answer.answer.clone()));
            }
            Err(e) => {
                if let Some(fallback) = e.fallback_message() {
                    self.transcript.push(ChatMessage::user(query.trim()));
                    self.transcript.push(ChatMessage::assistant(fallback));
                }
            }
        }

        result
    }
}
