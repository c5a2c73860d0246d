//! Upload state machine.
//!
//! ```text
//! Idle --select--> FileSelected --submit--> Uploading --ok--> Succeeded
//!                                                     \--err--> Failed
//! ```
//!
//! Transitions here are pure; the application layer performs the network
//! call between `begin_submit` and `succeed`/`fail`.

use serde::{Deserialize, Serialize};

use crate::api::UploadFile;
use crate::dataset::DatasetDetail;
use crate::error::{ClientError, Result};

pub const NO_FILE_SELECTED: &str = "No file selected";
pub const NOT_A_CSV: &str = "File must be a CSV";
/// Shown when a failed upload carries no message of its own.
pub const UPLOAD_FAILED: &str = "Upload failed";
pub const UPLOAD_IN_PROGRESS: &str = "Upload already in progress";

/// Current state of the upload workflow.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    FileSelected(UploadFile),
    Uploading,
    Succeeded(Box<DatasetDetail>),
    Failed(String),
}

/// Tag of an [`UploadState`] without its payload, used in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    FileSelected,
    Uploading,
    Succeeded,
    Failed,
}

impl UploadState {
    pub fn phase(&self) -> UploadPhase {
        match self {
            UploadState::Idle => UploadPhase::Idle,
            UploadState::FileSelected(_) => UploadPhase::FileSelected,
            UploadState::Uploading => UploadPhase::Uploading,
            UploadState::Succeeded(_) => UploadPhase::Succeeded,
            UploadState::Failed(_) => UploadPhase::Failed,
        }
    }

    pub fn selected_file(&self) -> Option<&UploadFile> {
        match self {
            UploadState::FileSelected(file) => Some(file),
            _ => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            UploadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Selects a file. Allowed from every state except `Uploading`.
    ///
    /// Non-CSV files are rejected without a transition.
    pub fn select(&mut self, file: UploadFile) -> Result<()> {
        if matches!(self, UploadState::Uploading) {
            return Err(ClientError::validation(UPLOAD_IN_PROGRESS));
        }
        if !file.is_csv() {
            return Err(ClientError::validation(NOT_A_CSV));
        }
        *self = UploadState::FileSelected(file);
        Ok(())
    }

    /// Moves `FileSelected` to `Uploading` and hands out the file.
    ///
    /// From any other state this is rejected and the state is unchanged; in
    /// particular a `Failed` upload cannot be resubmitted without selecting
    /// the file again.
    pub fn begin_submit(&mut self) -> Result<UploadFile> {
        match std::mem::take(self) {
            UploadState::FileSelected(file) => {
                *self = UploadState::Uploading;
                Ok(file)
            }
            UploadState::Uploading => {
                *self = UploadState::Uploading;
                Err(ClientError::validation(UPLOAD_IN_PROGRESS))
            }
            other => {
                *self = other;
                Err(ClientError::validation(NO_FILE_SELECTED))
            }
        }
    }

    pub fn succeed(&mut self, detail: DatasetDetail) {
        *self = UploadState::Succeeded(Box::new(detail));
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        *self = UploadState::Failed(message.into());
    }

    /// Returns to `Idle`, dropping any selected file. Not allowed while uploading.
    pub fn reset(&mut self) -> Result<()> {
        if matches!(self, UploadState::Uploading) {
            return Err(ClientError::validation(UPLOAD_IN_PROGRESS));
        }
        *self = UploadState::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv() -> UploadFile {
        UploadFile::new("data.csv", b"Equipment Name,Type\n".to_vec())
    }

    #[test]
    fn test_submit_from_idle_is_rejected() {
        let mut state = UploadState::Idle;
        let err = state.begin_submit().unwrap_err();

        assert_eq!(err, ClientError::validation(NO_FILE_SELECTED));
        assert_eq!(state, UploadState::Idle);
    }

    #[test]
    fn test_select_then_submit() {
        let mut state = UploadState::Idle;
        state.select(csv()).unwrap();
        assert_eq!(state.phase(), UploadPhase::FileSelected);

        let file = state.begin_submit().unwrap();
        assert_eq!(file.file_name, "data.csv");
        assert_eq!(state, UploadState::Uploading);
    }

    #[test]
    fn test_failed_cannot_be_resubmitted() {
        let mut state = UploadState::Idle;
        state.select(csv()).unwrap();
        state.begin_submit().unwrap();
        state.fail("Missing columns: Type");

        let err = state.begin_submit().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(state.failure_message(), Some("Missing columns: Type"));
        assert!(state.selected_file().is_none());
    }

    #[test]
    fn test_reselect_after_failure() {
        let mut state = UploadState::Failed("Upload failed".to_string());
        state.select(csv()).unwrap();
        assert!(state.begin_submit().is_ok());
    }

    #[test]
    fn test_non_csv_is_rejected_without_transition() {
        let mut state = UploadState::Idle;
        let err = state
            .select(UploadFile::new("notes.txt", vec![]))
            .unwrap_err();

        assert_eq!(err, ClientError::validation(NOT_A_CSV));
        assert_eq!(state, UploadState::Idle);
    }

    #[test]
    fn test_no_changes_while_uploading() {
        let mut state = UploadState::Uploading;
        assert!(state.select(csv()).is_err());
        assert!(state.reset().is_err());
        assert!(state.begin_submit().is_err());
        assert_eq!(state, UploadState::Uploading);
    }
}
