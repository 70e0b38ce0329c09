//! Persistence gateway trait and implementations

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::{PersistenceError, Result};

/// Load/save/remove of named serialized records.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Load a record, `None` when absent
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Save a record, replacing any previous value
    async fn save(&self, key: &str, blob: &str) -> Result<()>;

    /// Remove a record; removing an absent record succeeds
    async fn remove(&self, key: &str) -> Result<()>;
}

/// File-based persistence: one `<key>.json` file per record
#[derive(Debug, Clone)]
pub struct FilePersistence {
    base_path: PathBuf,
}

impl FilePersistence {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl PersistenceGateway for FilePersistence {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.record_path(key)?;

        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).await?;
        Ok(Some(contents))
    }

    async fn save(&self, key: &str, blob: &str) -> Result<()> {
        let path = self.record_path(key)?;
        fs::create_dir_all(&self.base_path).await?;

        // Replace the record atomically
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, blob).await?;
        fs::rename(&tmp_path, &path).await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.record_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory persistence for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the gateway contract.
    pub async fn insert_raw(&self, key: &str, blob: &str) {
        self.records
            .lock()
            .await
            .insert(key.to_string(), blob.to_string());
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.records.lock().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.records.lock().await.contains_key(key)
    }
}

#[async_trait]
impl PersistenceGateway for MemoryPersistence {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key).await)
    }

    async fn save(&self, key: &str, blob: &str) -> Result<()> {
        self.insert_raw(key, blob).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.records.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_persistence_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = FilePersistence::new(dir.path().join("records"));

        storage.save("ai-studio-history", "[]").await.unwrap();

        let loaded = storage.load("ai-studio-history").await.unwrap();
        assert_eq!(loaded.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_file_persistence_absent() {
        let dir = tempdir().unwrap();
        let storage = FilePersistence::new(dir.path());

        let result = storage.load("nonexistent").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_file_persistence_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = FilePersistence::new(dir.path());

        storage.save("test", "{}").await.unwrap();
        storage.remove("test").await.unwrap();
        storage.remove("test").await.unwrap();

        assert!(storage.load("test").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_persistence_rejects_path_keys() {
        let dir = tempdir().unwrap();
        let storage = FilePersistence::new(dir.path());

        for key in ["", "../escape", "a/b", ".hidden"] {
            let err = storage.save(key, "{}").await.unwrap_err();
            assert!(matches!(err, PersistenceError::InvalidKey(_)), "{key}");
        }
    }

    #[tokio::test]
    async fn test_memory_persistence_roundtrip() {
        let storage = MemoryPersistence::new();
        storage.save("k", "v").await.unwrap();
        assert!(storage.contains("k").await);

        storage.remove("k").await.unwrap();
        assert!(storage.load("k").await.unwrap().is_none());
    }
}
