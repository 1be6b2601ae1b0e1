use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DomainError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn api(status: u16, detail: impl Into<String>) -> Self {
        Self::Api {
            status,
            detail: detail.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Human-readable detail suitable for showing to a user verbatim.
    pub fn detail(&self) -> String {
        match self {
            Self::Api { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Raised locally when the indexed-repository limit has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Repository limit reached: {indexed} of {limit} repositories indexed")]
pub struct CapacityError {
    pub indexed: usize,
    pub limit: usize,
}

/// Failure to synchronize the registry with the backend.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to sync repositories: {0}")]
    Remote(#[source] DomainError),

    #[error("Failed to persist repository snapshot: {0}")]
    Persist(#[source] DomainError),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error("Repository URL must not be empty")]
    EmptyUrl,

    #[error("An ingestion is already in progress")]
    Busy,

    /// The backend refused the submission; carries its `detail` verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("Ingestion request failed: {0}")]
    Transport(#[source] DomainError),

    #[error("Ingestion cancelled")]
    Cancelled,
}

impl IngestError {
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::Capacity(_))
    }
}

/// Shown to the user whenever the chat backend cannot produce an answer.
pub const CHAT_FALLBACK_MESSAGE: &str =
    "Sorry, I couldn't reach the code assistant right now. Please try again in a moment.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("{fallback}")]
    Unavailable {
        fallback: String,
        #[source]
        source: DomainError,
    },
}

impl ChatError {
    pub fn unavailable(source: DomainError) -> Self {
        Self::Unavailable {
            fallback: CHAT_FALLBACK_MESSAGE.to_string(),
            source,
        }
    }

    /// Text to place in the transcript, if any.
    pub fn fallback_message(&self) -> Option<&str> {
        match self {
            Self::EmptyQuery => None,
            Self::Unavailable { fallback, .. } => Some(fallback),
        }
    }
}
