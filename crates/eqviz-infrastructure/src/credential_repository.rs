//! `CredentialRepository` implementations.

use async_trait::async_trait;
use eqviz_core::error::{ClientError, Result};
use eqviz_core::session::CredentialRepository;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::paths::EqvizPaths;
use crate::storage::AtomicTomlFile;

type Entries = BTreeMap<String, String>;

const FILE_MODE: u32 = 0o600;

/// Stores entries as a flat TOML table in `local_storage.toml`.
///
/// Every call reads or rewrites the file, so several client processes see
/// each other's changes. File I/O runs on the blocking pool.
#[derive(Clone)]
pub struct TomlCredentialRepository {
    file: Arc<AtomicTomlFile<Entries>>,
}

impl TomlCredentialRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path).with_mode(FILE_MODE)),
        }
    }

    pub fn from_paths(paths: &EqvizPaths) -> Self {
        Self::new(paths.local_storage_file())
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    async fn blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&AtomicTomlFile<Entries>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| ClientError::internal(format!("storage task failed: {}", e)))?
    }
}

#[async_trait]
impl CredentialRepository for TomlCredentialRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.blocking(move |file| {
            let entries = file.load()?.unwrap_or_default();
            Ok(entries.get(&key).cloned())
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.blocking(move |file| {
            file.update(Entries::new(), |entries| {
                entries.insert(key.clone(), value);
            })?;
            tracing::debug!(target: "storage", key = %key, "Stored entry");
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.blocking(move |file| {
            if file.load()?.is_none() {
                return Ok(());
            }
            let removed = file.update(Entries::new(), |entries| entries.remove(&key))?;
            if removed.is_some() {
                tracing::debug!(target: "storage", key = %key, "Removed entry");
            }
            Ok(())
        })
        .await
    }
}

/// Process-local repository for tests and `--ephemeral` runs.
#[derive(Clone, Default)]
pub struct InMemoryCredentialRepository {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
