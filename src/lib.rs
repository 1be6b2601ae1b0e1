pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    AskQuestionUseCase, ChatService, ChatSession, Clock, IngestReceipt, IngestRepositoryUseCase,
    IngestionSettings, KeyValueStore, RegistrySync, RepositoryBackend, RepositoryRegistry,
    SelectionManager,
};

pub use cli::Commands;

pub use connector::api::{Container, ContainerConfig, Router};
pub use connector::{
    HttpBackendClient, InMemoryStore, JsonFileStore, ManualClock, MockBackend, TokioClock,
};

pub use domain::{
    Answer, CapacityError, ChatError, ChatMessage, ChatQuery, ChatRole, ChatTranscript,
    DomainError, IngestError, IngestionOutcome, IngestionPhase, IngestionSnapshot, Repository,
    RepositoryStatus, StatusLog, SyncError, TerminalStatus, MAX_INDEXED_REPOSITORIES,
};
