use serde::{Deserialize, Deserializer, Serialize};

use super::Repository;

/// Answer returned by the backend for a chat query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<String>,
}

impl Answer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            confidence: None,
            sources: Vec::new(),
        }
    }
}

/// Outgoing chat query, optionally scoped to the active repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
}

impl ChatQuery {
    pub fn new(query: impl Into<String>, context: Option<&Repository>) -> Self {
        Self {
            query: query.into(),
            repo_id: context.map(|r| r.id().to_string()),
            repo_name: context.map(|r| r.name().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_optional_fields_default() {
        let answer: Answer = serde_json::from_str(r#"{"answer":"42"}"#).unwrap();
        assert_eq!(answer, Answer::new("42"));

        let answer: Answer =
            serde_json::from_str(r#"{"answer":"42","confidence":"high","sources":null}"#).unwrap();
        assert_eq!(answer.confidence.as_deref(), Some("high"));
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn test_query_omits_missing_context() {
        let json = serde_json::to_value(ChatQuery::new("where is main?", None)).unwrap();
        assert_eq!(json, serde_json::json!({ "query": "where is main?" }));
    }

    #[test]
    fn test_query_carries_repository_context() {
        let repo = Repository::provisional("r1", "https://github.com/a/b", None);
        let query = ChatQuery::new("explain auth", Some(&repo));

        assert_eq!(query.repo_id.as_deref(), Some("r1"));
        assert_eq!(query.repo_name.as_deref(), Some("b"));
    }
}
