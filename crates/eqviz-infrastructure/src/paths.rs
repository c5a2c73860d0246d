//! Path resolution for the eqviz client.
//!
//! ```text
//! ~/.config/eqviz/
//! ├── config.toml           # ClientConfig
//! ├── local_storage.toml    # persisted token and username (mode 600)
//! └── logs/
//!     └── eqviz.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "eqviz";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Cannot find the platform config directory")]
    ConfigDirNotFound,
}

impl From<PathError> for eqviz_core::ClientError {
    fn from(e: PathError) -> Self {
        eqviz_core::ClientError::config(e.to_string())
    }
}

/// Locations of every file the client reads or writes.
///
/// `EqvizPaths::from_platform()` resolves under the user's config
/// directory; `EqvizPaths::at(root)` roots everything in a given directory
/// (tests, `--config` overrides).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqvizPaths {
    root: PathBuf,
}

impl EqvizPaths {
    pub fn from_platform() -> Result<Self, PathError> {
        let base = dirs::config_dir().ok_or(PathError::ConfigDirNotFound)?;
        Ok(Self::at(base.join(APP_DIR)))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn local_storage_file(&self) -> PathBuf {
        self.root.join("local_storage.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Directory for downloaded reports.
    ///
    /// An explicit `configured` directory wins; otherwise the platform
    /// download directory, then the current directory.
    pub fn download_dir(configured: Option<&Path>) -> PathBuf {
        if let Some(dir) = configured {
            return dir.to_path_buf();
        }
        dirs::download_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_root() {
        let paths = EqvizPaths::at("/tmp/eqviz-test");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/eqviz-test/config.toml"));
        assert_eq!(
            paths.local_storage_file(),
            PathBuf::from("/tmp/eqviz-test/local_storage.toml")
        );
        assert_eq!(paths.logs_dir(), PathBuf::from("/tmp/eqviz-test/logs"));
    }

    #[test]
    fn test_configured_download_dir_wins() {
        let dir = PathBuf::from("/srv/reports");
        assert_eq!(EqvizPaths::download_dir(Some(&dir)), dir);
    }
}
