use serde::{Deserialize, Serialize};

use super::RepositoryStatus;

/// Final state of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalStatus {
    Indexed,
    Error,
}

impl TerminalStatus {
    pub fn from_status(status: RepositoryStatus) -> Option<Self> {
        match status {
            RepositoryStatus::Indexed => Some(TerminalStatus::Indexed),
            RepositoryStatus::Error => Some(TerminalStatus::Error),
            RepositoryStatus::Indexing => None,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            TerminalStatus::Indexed => "Repository indexed successfully",
            TerminalStatus::Error => "Indexing failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IngestionPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Finished(TerminalStatus),
}

impl IngestionPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, IngestionPhase::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionPhase::Idle => "idle",
            IngestionPhase::Submitting => "submitting",
            IngestionPhase::Polling => "polling",
            IngestionPhase::Finished(TerminalStatus::Indexed) => "indexed",
            IngestionPhase::Finished(TerminalStatus::Error) => "error",
        }
    }
}

/// Append-only list of status messages; consecutive repeats are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLog {
    entries: Vec<String>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the message was appended.
    pub fn push(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.entries.last() == Some(&message) {
            return false;
        }
        self.entries.push(message);
        true
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Observable state of the ingestion workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionSnapshot {
    pub phase: IngestionPhase,
    pub repo_id: Option<String>,
    pub log: StatusLog,
    pub progress: Option<u8>,
}

impl IngestionSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Result of an ingestion run that reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionOutcome {
    pub repo_id: String,
    pub status: TerminalStatus,
    pub log: StatusLog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_skips_consecutive_duplicates_only() {
        let mut log = StatusLog::new();

        assert!(log.push("Cloning..."));
        assert!(!log.push("Cloning..."));
        assert!(log.push("Parsing files..."));
        assert!(log.push("Cloning..."));

        assert_eq!(
            log.entries(),
            &["Cloning...", "Parsing files...", "Cloning..."]
        );
    }

    #[test]
    fn test_log_never_shrinks_or_repeats() {
        let messages = ["a", "a", "b", "b", "b", "a", "c", "c"];
        let mut log = StatusLog::new();
        let mut previous_len = 0;

        for m in messages {
            log.push(m);
            assert!(log.len() >= previous_len);
            previous_len = log.len();
        }

        assert!(log.entries().windows(2).all(|w| w[0] != w[1]));
        assert_eq!(log.entries(), &["a", "b", "a", "c"]);
    }

    #[test]
    fn test_terminal_from_status() {
        assert_eq!(
            TerminalStatus::from_status(RepositoryStatus::Indexed),
            Some(TerminalStatus::Indexed)
        );
        assert_eq!(TerminalStatus::from_status(RepositoryStatus::Indexing), None);
    }
}
