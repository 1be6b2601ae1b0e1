use serde::{Deserialize, Deserializer, Serialize};

/// Maximum number of repositories that may be in the `Indexed` state at once.
pub const MAX_INDEXED_REPOSITORIES: usize = 5;

/// Indexing status of a repository as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepositoryStatus {
    #[serde(alias = "Processing")]
    Indexing,
    Indexed,
    Error,
}

impl RepositoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryStatus::Indexing => "Indexing",
            RepositoryStatus::Indexed => "Indexed",
            RepositoryStatus::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RepositoryStatus::Indexed | RepositoryStatus::Error)
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, RepositoryStatus::Indexed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, RepositoryStatus::Indexing)
    }
}

impl std::fmt::Display for RepositoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    id: String,
    name: String,
    url: String,
    status: RepositoryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_message: Option<String>,
    /// Percent complete; only meaningful while indexing.
    #[serde(
        default,
        deserialize_with = "deserialize_progress",
        skip_serializing_if = "Option::is_none"
    )]
    progress: Option<u8>,
    #[serde(default)]
    branch: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    last_synced: String,
}

impl Repository {
    /// Record created locally right after the backend accepted a submission.
    pub fn provisional(id: impl Into<String>, url: impl Into<String>, message: Option<String>) -> Self {
        let url = url.into();
        Self {
            id: id.into(),
            name: name_from_url(&url),
            url,
            status: RepositoryStatus::Indexing,
            status_message: message,
            progress: Some(0),
            branch: "main".to_string(),
            language: String::new(),
            last_synced: "Just now".to_string(),
        }
    }

    /// Reconstitutes from persisted or remote data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        name: String,
        url: String,
        status: RepositoryStatus,
        status_message: Option<String>,
        progress: Option<u8>,
        branch: String,
        language: String,
        last_synced: String,
    ) -> Self {
        Self {
            id,
            name,
            url,
            status,
            status_message,
            progress,
            branch,
            language,
            last_synced,
        }
        .normalized()
    }

    /// Drops progress outside of `Indexing` and clamps it to 100.
    pub fn normalized(mut self) -> Self {
        self.progress = match self.status {
            RepositoryStatus::Indexing => self.progress.map(|p| p.min(100)),
            _ => None,
        };
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> RepositoryStatus {
        self.status
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn last_synced(&self) -> &str {
        &self.last_synced
    }

    pub fn is_indexed(&self) -> bool {
        self.status.is_indexed()
    }

    pub fn summary(&self) -> String {
        match self.progress {
            Some(p) => format!("{} [{} {}%]", self.name, self.status, p),
            None => format!("{} [{}]", self.name, self.status),
        }
    }
}

/// Derives a display name from a clone URL: last path segment without `.git`.
pub fn name_from_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        trimmed.to_string()
    } else {
        name.to_string()
    }
}

/// Counts records in the `Indexed` state.
pub fn indexed_count(repositories: &[Repository]) -> usize {
    repositories.iter().filter(|r| r.is_indexed()).count()
}

fn deserialize_progress<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.map(|p| p.clamp(0, 100) as u8))
}
