//! Infrastructure layer: file locations, atomic TOML storage, credential
//! persistence and configuration loading.

pub mod config_service;
pub mod credential_repository;
pub mod paths;
pub mod storage;

pub use config_service::ConfigService;
pub use credential_repository::{InMemoryCredentialRepository, TomlCredentialRepository};
pub use paths::{EqvizPaths, PathError};
pub use storage::{AtomicTomlFile, StorageError};
