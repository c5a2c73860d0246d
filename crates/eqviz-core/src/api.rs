//! Network boundary to the analysis service.
//!
//! The service is treated as an opaque but shaped collaborator. This module
//! only defines the calls the client makes and the shapes it expects back;
//! `eqviz-interaction` provides the HTTP implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dataset::{DatasetDetail, DatasetId, DatasetSummary};
use crate::error::Result;
use crate::session::Credentials;

/// Successful answer of the login and register endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Error payload returned by the service: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

/// The service only accepts names ending in `.csv`, case-sensitively.
pub fn is_csv_name(file_name: &str) -> bool {
    file_name.ends_with(".csv")
}

/// A file selected for upload, read fully into memory.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn is_csv(&self) -> bool {
        is_csv_name(&self.file_name)
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Calls the client makes against the analysis service.
///
/// Every authenticated call takes the raw token; implementations send it as
/// `Authorization: Token <token>`. A 401 answer must be reported as
/// [`crate::ClientError::Unauthorized`].
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// `POST /auth/login/`
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;

    /// `POST /auth/register/`
    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse>;

    /// `GET /datasets/` - at most five summaries, most recent first.
    async fn list_datasets(&self, token: &str) -> Result<Vec<DatasetSummary>>;

    /// `GET /datasets/{id}/`
    async fn get_dataset(&self, token: &str, id: DatasetId) -> Result<DatasetDetail>;

    /// `POST /datasets/upload_csv/` as multipart field `file`.
    async fn upload_csv(&self, token: &str, file: &UploadFile) -> Result<DatasetDetail>;

    /// `GET /datasets/{id}/generate_report/` - opaque report bytes.
    async fn generate_report(&self, token: &str, id: DatasetId) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_accepts_user_id() {
        let json = r#"{"token": "T1", "user_id": 4, "username": "alice"}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.token, "T1");
        assert_eq!(response.user_id, Some(4));
    }

    #[test]
    fn test_csv_detection() {
        assert!(UploadFile::new("data.csv", vec![]).is_csv());
        assert!(!UploadFile::new("DATA.CSV", vec![]).is_csv());
        assert!(!UploadFile::new("data.xlsx", vec![]).is_csv());
        assert!(!is_csv_name("report.csv.pdf"));
    }
}
