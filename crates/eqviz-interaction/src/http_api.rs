//! HttpAnalysisApi - reqwest implementation of [`AnalysisApi`].
//!
//! Endpoints are resolved relative to the configured base URL
//! (e.g. `http://localhost:8000/api`):
//!
//! | call            | request                                   |
//! |-----------------|-------------------------------------------|
//! | login           | `POST auth/login/`                        |
//! | register        | `POST auth/register/`                     |
//! | list_datasets   | `GET datasets/`                           |
//! | get_dataset     | `GET datasets/{id}/`                      |
//! | upload_csv      | `POST datasets/upload_csv/` (multipart)   |
//! | generate_report | `GET datasets/{id}/generate_report/`      |

use async_trait::async_trait;
use eqviz_core::api::{AnalysisApi, AuthResponse, ErrorPayload, UploadFile};
use eqviz_core::config::ClientConfig;
use eqviz_core::dataset::{DatasetDetail, DatasetId, DatasetSummary};
use eqviz_core::error::{ClientError, Result};
use eqviz_core::session::Credentials;
use eqviz_core::session::authorization_header;
use eqviz_core::upload::{NOT_A_CSV, UPLOAD_FAILED};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const REPORT_FALLBACK_MESSAGE: &str = "Failed to download report";
const UNKNOWN_ERROR: &str = "Unknown error";

/// Which call a failed response belongs to; decides how it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Auth,
    List,
    Detail(DatasetId),
    Upload,
    Report,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

/// Analysis service client over HTTP.
#[derive(Clone)]
pub struct HttpAnalysisApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpAnalysisApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.server_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> Result<RequestBuilder> {
        if token.is_empty() {
            return Err(ClientError::Unauthorized);
        }
        Ok(request
            .header(reqwest::header::AUTHORIZATION, authorization_header(token))
            .timeout(self.timeout))
    }

    async fn send(&self, request: RequestBuilder, call: Call) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!(target: "http_api", call = ?call, error = %e, "Request failed");
            match call {
                Call::Report => ClientError::network(format!("{}: {}", REPORT_FALLBACK_MESSAGE, e)),
                _ => ClientError::network(e.to_string()),
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| UNKNOWN_ERROR.to_string());
        let error = failure(call, status, &body);
        tracing::debug!(target: "http_api", call = ?call, status = status.as_u16(), "Service rejected request");
        Err(error)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder, call: Call) -> Result<T> {
        let response = self.send(request, call).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Serialization {
                format: "JSON".to_string(),
                message: format!("Failed to parse service response: {}", e),
            })
    }
}

/// Extracts the `error` field of a service error payload.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| payload.error)
        .filter(|message| !message.trim().is_empty())
}

/// Maps a non-success response to the error the caller should see.
fn failure(call: Call, status: StatusCode, body: &str) -> ClientError {
    let message = error_message(body);
    match call {
        Call::Auth => ClientError::auth_or_fallback(message),
        _ if status == StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        Call::Detail(id) if status == StatusCode::NOT_FOUND => {
            ClientError::not_found("dataset", id.to_string())
        }
        Call::Upload => ClientError::server(
            status.as_u16(),
            message.unwrap_or_else(|| UPLOAD_FAILED.to_string()),
        ),
        Call::Report => ClientError::server(status.as_u16(), REPORT_FALLBACK_MESSAGE),
        Call::List | Call::Detail(_) => ClientError::server(
            status.as_u16(),
            message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        ),
    }
}

fn upload_part(file: &UploadFile) -> Result<Part> {
    let mime = mime_guess::from_path(&file.file_name).first_or_octet_stream();
    Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(mime.essence_str())
        .map_err(|e| ClientError::internal(format!("invalid MIME type '{}': {}", mime, e)))
}

#[async_trait]
impl AnalysisApi for HttpAnalysisApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let body = LoginRequest {
            username: &credentials.username,
            password: &credentials.password,
        };
        let request = self
            .client
            .post(self.endpoint("auth/login/"))
            .json(&body)
            .timeout(self.timeout);
        self.json(request, Call::Auth).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let body = RegisterRequest {
            username: &credentials.username,
            password: &credentials.password,
            email: credentials.email.as_deref(),
        };
        let request = self
            .client
            .post(self.endpoint("auth/register/"))
            .json(&body)
            .timeout(self.timeout);
        self.json(request, Call::Auth).await
    }

    async fn list_datasets(&self, token: &str) -> Result<Vec<DatasetSummary>> {
        let request = self.authorized(self.client.get(self.endpoint("datasets/")), token)?;
        self.json(request, Call::List).await
    }

    async fn get_dataset(&self, token: &str, id: DatasetId) -> Result<DatasetDetail> {
        let request = self.authorized(
            self.client.get(self.endpoint(&format!("datasets/{}/", id))),
            token,
        )?;
        self.json(request, Call::Detail(id)).await
    }

    async fn upload_csv(&self, token: &str, file: &UploadFile) -> Result<DatasetDetail> {
        if !file.is_csv() {
            return Err(ClientError::validation(NOT_A_CSV));
        }
        let form = Form::new().part("file", upload_part(file)?);
        let request = self.authorized(
            self.client
                .post(self.endpoint("datasets/upload_csv/"))
                .multipart(form),
            token,
        )?;

        tracing::debug!(target: "http_api", file = %file.file_name, size = file.bytes.len(), "Uploading CSV");
        self.json(request, Call::Upload).await
    }

    async fn generate_report(&self, token: &str, id: DatasetId) -> Result<Vec<u8>> {
        let request = self.authorized(
            self.client
                .get(self.endpoint(&format!("datasets/{}/generate_report/", id))),
            token,
        )?;
        let response = self.send(request, Call::Report).await?;
        let bytes = response.bytes().await.map_err(|e| {
            ClientError::network(format!("{}: {}", REPORT_FALLBACK_MESSAGE, e))
        })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> HttpAnalysisApi {
        HttpAnalysisApi::new("http://localhost:8000/api/", Duration::from_secs(5))
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let api = api();
        assert_eq!(api.base_url(), "http://localhost:8000/api");
        assert_eq!(api.endpoint("datasets/"), "http://localhost:8000/api/datasets/");
        assert_eq!(
            api.endpoint("/datasets/7/generate_report/"),
            "http://localhost:8000/api/datasets/7/generate_report/"
        );
    }

    #[test]
    fn test_auth_failure_uses_payload_or_fallback() {
        let err = failure(Call::Auth, StatusCode::UNAUTHORIZED, r#"{"error": "Invalid credentials"}"#);
        assert_eq!(err, ClientError::auth("Invalid credentials"));

        let err = failure(Call::Auth, StatusCode::BAD_REQUEST, "<html>oops</html>");
        assert_eq!(err.user_message(), "Authentication failed");
    }

    #[test]
    fn test_unauthorized_on_authenticated_calls() {
        for call in [Call::List, Call::Detail(3), Call::Upload, Call::Report] {
            let err = failure(call, StatusCode::UNAUTHORIZED, "");
            assert!(err.is_unauthorized(), "{:?}", call);
        }
    }

    #[test]
    fn test_upload_failure_messages() {
        let err = failure(Call::Upload, StatusCode::BAD_REQUEST, r#"{"error": "Missing columns: Type"}"#);
        assert_eq!(err.user_message(), "Missing columns: Type");

        let err = failure(Call::Upload, StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.user_message(), UPLOAD_FAILED);
    }

    #[test]
    fn test_report_and_detail_failures() {
        let err = failure(Call::Report, StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": "boom"}"#);
        assert_eq!(err.user_message(), REPORT_FALLBACK_MESSAGE);

        let err = failure(Call::Detail(42), StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());

        let err = failure(Call::List, StatusCode::BAD_GATEWAY, "");
        assert_eq!(err, ClientError::server(502, UNKNOWN_ERROR));
    }

    #[test]
    fn test_blank_error_payload_is_ignored() {
        assert_eq!(error_message(r#"{"error": "  "}"#), None);
        assert_eq!(error_message(r#"{"detail": "x"}"#), None);
        assert_eq!(error_message(r#"{"error": "bad"}"#).as_deref(), Some("bad"));
    }

    #[test]
    fn test_upload_part_for_csv() {
        let file = UploadFile::new("plant.csv", b"a,b\n".to_vec());
        assert!(upload_part(&file).is_ok());
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_before_sending() {
        let err = api().list_datasets("").await.unwrap_err();
        assert_eq!(err, ClientError::Unauthorized);
    }

    #[tokio::test]
    async fn test_non_csv_upload_is_rejected_before_sending() {
        let file = UploadFile::new("notes.txt", vec![]);
        let err = api().upload_csv("T1", &file).await.unwrap_err();
        assert_eq!(err, ClientError::validation(NOT_A_CSV));
    }
}
