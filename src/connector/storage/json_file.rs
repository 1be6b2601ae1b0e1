//! File-backed key/value storage: one JSON document per key.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::application::KeyValueStore;
use crate::domain::DomainError;

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens (and creates if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            DomainError::storage(format!("Failed to create data dir {}: {}", dir.display(), e))
        })?;
        debug!("Using local state at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DomainError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(DomainError::invalid_input(format!("Invalid store key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for JsonFileStore {
    /// Writes to a sibling temp file and renames it into place.
    fn save(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let path = self.path_for(key)?;
        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Option<String> {
        let path = match self.path_for(key) {
            Ok(path) => path,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn delete(&self, key: &str) -> Result<(), DomainError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{load_json, REPOSITORIES_KEY};

    #[test]
    fn test_round_trip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        JsonFileStore::open(dir.path())
            .unwrap()
            .save(REPOSITORIES_KEY, "[]")
            .unwrap();
        let reopened = JsonFileStore::open(dir.path()).unwrap();

        assert_eq!(reopened.load(REPOSITORIES_KEY).as_deref(), Some("[]"));
        assert!(dir.path().join("repositories.json").exists());
    }

    #[test]
    fn test_missing_key_is_absent_and_deletable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();

        assert_eq!(store.load("selectedRepo"), None);
        store.delete("selectedRepo").unwrap();
    }

    #[test]
    fn test_corrupt_payload_decodes_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("repositories.json"), "{{garbage").unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();

        let decoded: Option<Vec<crate::domain::Repository>> =
            load_json(&store, REPOSITORIES_KEY);
        assert!(decoded.is_none());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();

        assert!(store.save("../escape", "x").is_err());
        assert_eq!(store.load("../escape"), None);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let store = JsonFileStore::open(&nested).unwrap();

        assert!(store.dir().is_dir());
    }
}
