//! Crash-safe TOML files.
//!
//! Writes go to a hidden sibling temp file which is synced and then renamed
//! over the target, so readers only ever see a complete file.
//! Read-modify-write cycles hold an exclusive `fs2` lock on a `.lock` sibling.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to lock {path}: {message}")]
    Lock { path: PathBuf, message: String },
}

impl From<StorageError> for eqviz_core::ClientError {
    fn from(e: StorageError) -> Self {
        eqviz_core::ClientError::storage(e.to_string())
    }
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A TOML file holding one `T`.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    mode: Option<u32>,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            mode: None,
            _phantom: PhantomData,
        }
    }

    /// Unix permission bits applied to every write (e.g. `0o600`).
    /// Ignored on other platforms.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file. A missing or blank file yields `Ok(None)`.
    pub fn load(&self) -> Result<Option<T>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(io_at(&self.path))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let data = toml::from_str(&content).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(data))
    }

    pub fn save(&self, data: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_at(parent))?;
            }
        }

        let body = toml::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path).map_err(io_at(&tmp_path))?;
        self.restrict(&tmp_path)?;
        tmp_file
            .write_all(body.as_bytes())
            .map_err(io_at(&tmp_path))?;
        tmp_file.sync_all().map_err(io_at(&tmp_path))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path).map_err(io_at(&self.path))?;
        Ok(())
    }

    /// Locked read-modify-write. `f` sees the current contents (or
    /// `default_value` when the file is absent); its result is written back
    /// only if it returns `Ok`.
    pub fn update<F, R>(&self, default_value: T, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut T) -> R,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        let result = f(&mut data);
        self.save(&data)?;

        Ok(result)
    }

    fn temp_path(&self) -> Result<PathBuf, StorageError> {
        let file_name = self.path.file_name().ok_or_else(|| StorageError::Io {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(self.path.with_file_name(tmp_name))
    }

    #[cfg(unix)]
    fn restrict(&self, path: &Path) -> Result<(), StorageError> {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = self.mode {
            fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(io_at(path))?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn restrict(&self, _path: &Path) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Exclusive lock on `<file>.lock`, released on drop.
struct FileLock {
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, StorageError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_at(parent))?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_at(&lock_path))?;

        fs2::FileExt::lock_exclusive(&file).map_err(|e| StorageError::Lock {
            path: lock_path.clone(),
            message: e.to_string(),
        })?;

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = fs::remove_file(&self.lock_path);
    }
}
