//! UploadWorkflow - drives [`UploadState`] through a CSV upload.

use eqviz_core::api::{UploadFile, is_csv_name};
use eqviz_core::dataset::DatasetDetail;
use eqviz_core::error::{ClientError, Result};
use eqviz_core::event::ClientEvent;
use eqviz_core::upload::{NOT_A_CSV, UPLOAD_FAILED, UploadState};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::context::ClientContext;
use crate::sync::DatasetSync;

pub struct UploadWorkflow {
    ctx: Arc<ClientContext>,
    sync: Arc<DatasetSync>,
    state: Mutex<UploadState>,
}

impl UploadWorkflow {
    pub(crate) fn new(ctx: Arc<ClientContext>, sync: Arc<DatasetSync>) -> Self {
        Self {
            ctx,
            sync,
            state: Mutex::new(UploadState::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UploadState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` on the state and publishes the new phase if it changed.
    fn transition<R>(&self, f: impl FnOnce(&mut UploadState) -> R) -> R {
        let (result, before, after) = {
            let mut state = self.lock();
            let before = state.phase();
            let result = f(&mut state);
            (result, before, state.phase())
        };
        if before != after {
            tracing::debug!(target: "upload", from = ?before, to = ?after, "Upload state changed");
            self.ctx.events.publish(ClientEvent::UploadChanged { phase: after });
        }
        result
    }

    pub fn state(&self) -> UploadState {
        self.lock().clone()
    }

    pub fn select(&self, file: UploadFile) -> Result<()> {
        self.transition(|state| state.select(file))
    }

    /// Reads `path` and selects it. Non-CSV names are rejected before reading.
    pub async fn select_path(&self, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ClientError::validation(NOT_A_CSV))?;
        if !is_csv_name(&file_name) {
            return Err(ClientError::validation(NOT_A_CSV));
        }

        let bytes = tokio::fs::read(path).await?;
        self.select(UploadFile::new(file_name, bytes))
    }

    pub fn reset(&self) -> Result<()> {
        self.transition(|state| state.reset())
    }

    /// Uploads the selected file.
    ///
    /// On success the returned detail becomes current, the list is refreshed
    /// (a failed refresh does not undo the detail) and the workflow returns
    /// to `Idle`. On failure the workflow stays `Failed` with the message
    /// and a new file must be selected before the next submit.
    pub async fn submit(&self) -> Result<DatasetDetail> {
        let authorization = self.ctx.state.read().await.authorization();

        let file = self.transition(|state| state.begin_submit())?;
        let Some((token, epoch)) = authorization else {
            self.transition(|state| *state = UploadState::FileSelected(file));
            return Err(ClientError::Unauthorized);
        };

        tracing::info!(target: "upload", file = %file.file_name, size = file.bytes.len(), "Uploading");
        let result = self.ctx.api.upload_csv(&token, &file).await;

        let detail = match result {
            Ok(detail) => detail,
            Err(e) => {
                let message = Some(e.user_message())
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| UPLOAD_FAILED.to_string());
                tracing::warn!(target: "upload", error = %e, "Upload failed");
                self.transition(|state| state.fail(message));
                return Err(e);
            }
        };

        tracing::info!(target: "upload", id = detail.id, name = %detail.name, "Upload succeeded");
        self.transition(|state| state.succeed(detail.clone()));

        if self.sync.set_current(epoch, detail.clone()).await {
            self.sync.refresh_list().await;
        } else {
            tracing::debug!(target: "upload", "Session changed during upload, result not applied");
        }

        self.transition(|state| {
            if matches!(state, UploadState::Succeeded(_)) {
                *state = UploadState::Idle;
            }
        });
        Ok(detail)
    }
}
