//! In-memory key/value storage.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::application::KeyValueStore;
use crate::domain::DomainError;

/// Volatile store for testing and `--memory-storage` sessions.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for InMemoryStore {
    fn save(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.entries().remove(key);
        Ok(())
    }
}
