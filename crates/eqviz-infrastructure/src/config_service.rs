//! Loads and caches `ClientConfig` from `config.toml`.

use eqviz_core::config::ClientConfig;
use eqviz_core::error::{ClientError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::paths::EqvizPaths;
use crate::storage::AtomicTomlFile;

pub const ENV_SERVER_URL: &str = "EQVIZ_SERVER_URL";
pub const ENV_REFRESH_INTERVAL_MS: &str = "EQVIZ_REFRESH_INTERVAL_MS";

/// Loads the configuration once and serves clones from a cache.
///
/// A missing file yields defaults. Environment overrides are applied on
/// top of the file, then the result is validated.
#[derive(Clone)]
pub struct ConfigService {
    path: PathBuf,
    cached: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_paths(paths: &EqvizPaths) -> Self {
        Self::new(paths.config_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_config(&self) -> Result<ClientConfig> {
        self.get_config_with(|key| std::env::var(key).ok())
    }

    /// Same as [`get_config`](Self::get_config) with an explicit environment lookup.
    pub fn get_config_with<F>(&self, env: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cached) = self
            .cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, env)?;
        config.validate()?;

        tracing::debug!(
            target: "storage",
            path = %self.path.display(),
            server_url = %config.server_url,
            "Loaded configuration"
        );

        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(config.clone());
        Ok(config)
    }

    pub fn invalidate_cache(&self) {
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Writes `config` to the file and replaces the cache.
    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        config.validate()?;
        AtomicTomlFile::new(self.path.clone()).save(config)?;
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(config.clone());
        Ok(())
    }

    fn load_file(&self) -> Result<ClientConfig> {
        AtomicTomlFile::<ClientConfig>::new(self.path.clone())
            .load()
            .map(Option::unwrap_or_default)
            .map_err(|e| ClientError::config(e.to_string()))
    }
}

fn apply_env_overrides<F>(config: &mut ClientConfig, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env(ENV_SERVER_URL).filter(|v| !v.trim().is_empty()) {
        config.server_url = url.trim().to_string();
    }
    if let Some(raw) = env(ENV_REFRESH_INTERVAL_MS) {
        config.refresh_interval_ms = raw.trim().parse().map_err(|_| {
            ClientError::config(format!("{} must be an integer, got '{}'", ENV_REFRESH_INTERVAL_MS, raw))
        })?;
    }
    Ok(())
}
