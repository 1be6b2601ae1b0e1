use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::domain::DomainError;

/// Key under which the last synced repository list is cached.
pub const REPOSITORIES_KEY: &str = "repositories";
/// Key under which the active repository snapshot is cached.
pub const SELECTED_REPOSITORY_KEY: &str = "selectedRepo";

/// Durable string key/value storage.
///
/// `load` never fails: a missing or unreadable entry is simply absent.
pub trait KeyValueStore: Send + Sync {
    fn save(&self, key: &str, value: &str) -> Result<(), DomainError>;

    fn load(&self, key: &str) -> Option<String>;

    /// Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), DomainError>;
}

/// Loads and decodes a JSON entry. Corrupt payloads are logged and treated as absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.load(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring corrupt stored entry '{}': {}", key, e);
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), DomainError> {
    let raw = serde_json::to_string(value)
        .map_err(|e| DomainError::storage(format!("Failed to encode '{}': {}", key, e)))?;
    store.save(key, &raw)
}
