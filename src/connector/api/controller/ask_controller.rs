use anyhow::Result;

use crate::{Answer, ChatError};

use super::super::Container;

pub struct AskController<'a> {
    container: &'a Container,
}

impl<'a> AskController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Asks about the active repository, or about everything when none is set.
    pub async fn ask(&self, query: String) -> Result<String> {
        let registry = self.container.registry();
        let context = self.container.selection().resolve(&registry);

        let mut session = self.container.chat_session();
        match session.send(&query, context.as_ref()).await {
            Ok(answer) => Ok(format_answer(&answer)),
            Err(ChatError::EmptyQuery) => Err(ChatError::EmptyQuery.into()),
            Err(e) => Ok(e.fallback_message().unwrap_or_default().to_string()),
        }
    }
}

fn format_answer(answer: &Answer) -> String {
    let mut output = answer.answer.clone();
    if let Some(confidence) = &answer.confidence {
        output.push_str(&format!("\n\nConfidence: {}", confidence));
    }
    if !answer.sources.is_empty() {
        output.push_str("\nSources:");
        for source in &answer.sources {
            output.push_str(&format!("\n  - {}", source));
        }
    }
    output
}
