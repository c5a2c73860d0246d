//! Error types for the eqviz client.

use thiserror::Error;

/// Fallback message used when the service rejects credentials without a payload.
pub const AUTH_FALLBACK_MESSAGE: &str = "Authentication failed";

/// A shared error type for the whole client.
///
/// Variants follow the failure taxonomy of the client: authentication,
/// local validation, and network/server failures, plus the storage and
/// configuration errors of the infrastructure layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Login or registration was rejected.
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// An authenticated request was issued without a token, or the service answered 401.
    #[error("Not authenticated")]
    Unauthorized,

    /// Request rejected locally, before any network call.
    #[error("{0}")]
    Validation(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Transport-level failure (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Local persistence failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Creates an Auth error from an optional server message.
    pub fn auth_or_fallback(message: Option<String>) -> Self {
        Self::auth(message.unwrap_or_else(|| AUTH_FALLBACK_MESSAGE.to_string()))
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a Server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an authentication failure of either kind.
    ///
    /// A missing token and a 401 answer are treated the same way as a
    /// rejected login.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::Unauthorized)
    }

    /// Check if the service rejected the token (or no token was available).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Check if this is a local validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this failure came from the network boundary.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// Message suitable for showing to a user as a transient notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth { message } => message.clone(),
            Self::Validation(message) => message.clone(),
            Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_fallback_message() {
        let err = ClientError::auth_or_fallback(None);
        assert_eq!(err.user_message(), "Authentication failed");

        let err = ClientError::auth_or_fallback(Some("Invalid credentials".to_string()));
        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[test]
    fn test_unauthorized_counts_as_auth_error() {
        assert!(ClientError::Unauthorized.is_auth_error());
        assert!(ClientError::auth("nope").is_auth_error());
        assert!(!ClientError::network("down").is_auth_error());
    }

    #[test]
    fn test_transport_predicate() {
        assert!(ClientError::network("timeout").is_transport());
        assert!(ClientError::server(500, "boom").is_transport());
        assert!(!ClientError::validation("no file selected").is_transport());
    }

    #[test]
    fn test_validation_display_is_bare_message() {
        let err = ClientError::validation("No file selected");
        assert_eq!(err.to_string(), "No file selected");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ClientError = io.into();
        assert!(matches!(err, ClientError::Storage(_)));
    }
}
