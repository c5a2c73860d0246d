//! Credential repository trait.

use async_trait::async_trait;

use crate::error::Result;

/// Storage key for the authentication token.
pub const TOKEN_KEY: &str = "token";

/// Storage key for the username.
pub const USERNAME_KEY: &str = "username";

/// Durable client-local storage for the session's two scalar entries.
///
/// The token and the username are stored as independent entries, like two
/// keys in a browser's local storage. Only the session manager writes them.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Reads an entry. Missing entries are `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes an entry, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes an entry. Removing a missing entry is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
