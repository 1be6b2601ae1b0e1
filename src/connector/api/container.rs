use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::{
    AskQuestionUseCase, ChatService, ChatSession, Clock, IngestRepositoryUseCase,
    IngestionSettings, KeyValueStore, RegistrySync, RepositoryBackend, RepositoryRegistry,
    SelectionManager, DEFAULT_REFRESH_INTERVAL,
};
use crate::connector::{
    HttpBackendClient, InMemoryStore, JsonFileStore, MockBackend, TokioClock, DEFAULT_API_URL,
    DEFAULT_TIMEOUT,
};

pub const DEFAULT_DATA_DIR: &str = "~/.codenav";

pub struct ContainerConfig {
    pub api_url: String,
    pub data_dir: String,
    /// Keep local state in memory only; nothing is written to `data_dir`.
    pub memory_storage: bool,
    /// Use the in-process mock backend instead of HTTP.
    pub mock_backend: bool,
    pub request_timeout: Duration,
    pub refresh_interval: Duration,
    pub ingestion: IngestionSettings,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
            memory_storage: false,
            mock_backend: false,
            request_timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            ingestion: IngestionSettings::default(),
        }
    }
}

impl ContainerConfig {
    /// Defaults overridden by environment variables:
    ///
    /// | Variable               | Default                      |
    /// |------------------------|------------------------------|
    /// | `CODENAV_API_URL`      | `http://127.0.0.1:8000/api`  |
    /// | `CODENAV_DATA_DIR`     | `~/.codenav`                 |
    /// | `CODENAV_TIMEOUT_SECS` | `30`                         |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("CODENAV_API_URL") {
            config.api_url = url;
        }
        if let Ok(dir) = std::env::var("CODENAV_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Some(secs) = std::env::var("CODENAV_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Session context: every component for one logged-in session, wired once.
///
/// Consumers receive the container by reference; [`Container::shutdown`]
/// ends the session and stops any background loops it started.
pub struct Container {
    backend: Arc<dyn RepositoryBackend>,
    chat_service: Arc<dyn ChatService>,
    clock: Arc<dyn Clock>,
    registry: Arc<RepositoryRegistry>,
    selection: Arc<SelectionManager>,
    ingest_use_case: Arc<IngestRepositoryUseCase>,
    shutdown: CancellationToken,
    config: ContainerConfig,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = if config.memory_storage {
            debug!("Using in-memory local state");
            Arc::new(InMemoryStore::new())
        } else {
            Arc::new(JsonFileStore::open(expand_tilde(&config.data_dir))?)
        };

        let (backend, chat_service): (Arc<dyn RepositoryBackend>, Arc<dyn ChatService>) =
            if config.mock_backend {
                debug!("Using mock backend");
                let mock = Arc::new(MockBackend::new());
                (mock.clone(), mock)
            } else {
                debug!("Using backend at {}", config.api_url);
                let http = Arc::new(HttpBackendClient::new(
                    config.api_url.clone(),
                    config.request_timeout,
                )?);
                (http.clone(), http)
            };

        Ok(Self::with_parts(
            config,
            backend,
            chat_service,
            store,
            Arc::new(TokioClock::new()),
        ))
    }

    /// Wires the session from explicit parts.
    pub fn with_parts(
        config: ContainerConfig,
        backend: Arc<dyn RepositoryBackend>,
        chat_service: Arc<dyn ChatService>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Arc::new(RepositoryRegistry::new(backend.clone(), store.clone()));
        let selection = Arc::new(SelectionManager::new(store));
        let ingest_use_case = Arc::new(
            IngestRepositoryUseCase::new(backend.clone(), registry.clone(), clock.clone())
                .with_settings(config.ingestion),
        );

        Self {
            backend,
            chat_service,
            clock,
            registry,
            selection,
            ingest_use_case,
            shutdown: CancellationToken::new(),
            config,
        }
    }

    pub fn registry(&self) -> Arc<RepositoryRegistry> {
        self.registry.clone()
    }

    pub fn selection(&self) -> Arc<SelectionManager> {
        self.selection.clone()
    }

    pub fn ingest_use_case(&self) -> Arc<IngestRepositoryUseCase> {
        self.ingest_use_case.clone()
    }

    pub fn ask_use_case(&self) -> AskQuestionUseCase {
        AskQuestionUseCase::new(self.chat_service.clone())
    }

    pub fn chat_session(&self) -> ChatSession {
        ChatSession::new(self.ask_use_case())
    }

    pub fn backend(&self) -> Arc<dyn RepositoryBackend> {
        self.backend.clone()
    }

    /// Starts the periodic registry refresh for an active listing view.
    ///
    /// Cancel the returned token to deactivate the view; session shutdown
    /// cancels it as well.
    pub fn start_registry_sync(&self) -> (CancellationToken, JoinHandle<()>) {
        let token = self.shutdown.child_token();
        let handle = RegistrySync::spawn(
            self.registry.clone(),
            self.clock.clone(),
            self.config.refresh_interval,
            token.clone(),
        );
        (token, handle)
    }

    /// Ends the session: stops background loops and any running ingestion.
    pub fn shutdown(&self) {
        debug!("Shutting down session");
        self.shutdown.cancel();
        self.ingest_use_case.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn data_dir(&self) -> &str {
        &self.config.data_dir
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    pub fn memory_storage(&self) -> bool {
        self.config.memory_storage
    }

    pub fn mock_backend(&self) -> bool {
        self.config.mock_backend
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return PathBuf::from(home);
            }
            return PathBuf::from(home).join(&path[2..]);
        }
    }
    PathBuf::from(path)
}
