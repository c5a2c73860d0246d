//! DatasetSync - fetches the list and details into the shared store.
//!
//! Background refreshes are silent: failures are logged and published as
//! `SyncFailed`, the previous view is kept. User-initiated calls
//! (`select_detail`, `download_report`) return their errors.

use async_trait::async_trait;
use chrono::Utc;
use eqviz_core::dataset::{DatasetDetail, DatasetId, DetailApply, DetailTicket, ListApply};
use eqviz_core::error::{ClientError, Result};
use eqviz_core::event::ClientEvent;
use eqviz_core::session::EndReason;
use std::path::PathBuf;
use std::sync::Arc;

use super::scheduler::SyncTarget;
use crate::context::ClientContext;
use crate::state::Epoch;

pub const NO_DATASET_SELECTED: &str = "No dataset selected";

/// Result of a synchronization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The response was written to the store.
    Applied,
    /// A newer response, a newer selection or a session change won; the
    /// response was dropped.
    Stale,
    /// No active session; nothing was sent.
    Skipped,
    /// The request failed; the store is unchanged.
    Failed,
}

pub struct DatasetSync {
    ctx: Arc<ClientContext>,
}

impl DatasetSync {
    pub(crate) fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }

    /// Refreshes the list for the active session.
    ///
    /// Replaces the list wholesale and records the update time. When nothing
    /// is selected yet, the first entry's detail is fetched before returning.
    pub async fn refresh_list(&self) -> SyncOutcome {
        self.refresh(None).await
    }

    async fn refresh(&self, expected: Option<Epoch>) -> SyncOutcome {
        let (token, epoch, ticket) = {
            let mut state = self.ctx.state.write().await;
            let Some((token, epoch)) = state.authorization() else {
                return SyncOutcome::Skipped;
            };
            if expected.is_some_and(|e| e != epoch) {
                return SyncOutcome::Skipped;
            }
            (token, epoch, state.store_mut().begin_list_request())
        };

        let result = self.ctx.api.list_datasets(&token).await;

        let datasets = match result {
            Ok(datasets) => datasets,
            Err(e) => return self.background_failure(e, epoch, "List refresh failed").await,
        };

        let count = datasets.len();
        let (auto_select, updated_at) = {
            let mut state = self.ctx.state.write().await;
            if !state.is_current(epoch) {
                tracing::debug!(target: "dataset_sync", ticket = ticket.id(), "Dropping list for ended session");
                return SyncOutcome::Stale;
            }
            let store = state.store_mut();
            match store.apply_list(ticket, datasets, Utc::now()) {
                ListApply::Stale => {
                    tracing::debug!(target: "dataset_sync", ticket = ticket.id(), "Dropping stale list response");
                    return SyncOutcome::Stale;
                }
                ListApply::Applied { auto_select } => {
                    let auto_select = auto_select.map(|id| (id, store.begin_detail_request()));
                    (auto_select, store.last_update().unwrap_or_else(Utc::now))
                }
            }
        };

        tracing::debug!(target: "dataset_sync", count, "List refreshed");
        self.ctx.events.publish(ClientEvent::ListRefreshed { count, updated_at });

        if let Some((id, detail_ticket)) = auto_select {
            tracing::debug!(target: "dataset_sync", id, "Auto-selecting most recent dataset");
            if let Err(e) = self.fetch_detail(&token, epoch, id, detail_ticket).await {
                self.background_failure(e, epoch, "Auto-select failed").await;
            }
        }

        SyncOutcome::Applied
    }

    /// Fetches dataset `id` and makes it the current detail.
    ///
    /// A later selection or an upload result supersedes this one, in which
    /// case `Ok(SyncOutcome::Stale)` is returned. On failure the previous
    /// detail stays current.
    pub async fn select_detail(&self, id: DatasetId) -> Result<SyncOutcome> {
        let (token, epoch, ticket) = {
            let mut state = self.ctx.state.write().await;
            let (token, epoch) = state.authorization().ok_or(ClientError::Unauthorized)?;
            (token, epoch, state.store_mut().begin_detail_request())
        };

        self.fetch_detail(&token, epoch, id, ticket).await
    }

    async fn fetch_detail(
        &self,
        token: &str,
        epoch: Epoch,
        id: DatasetId,
        ticket: DetailTicket,
    ) -> Result<SyncOutcome> {
        let result = self.ctx.api.get_dataset(token, id).await;

        let mut state = self.ctx.state.write().await;
        if !state.is_current(epoch) {
            return Ok(SyncOutcome::Stale);
        }
        let detail = match result {
            Ok(detail) => detail,
            Err(e) => {
                state.store_mut().abandon_detail(ticket);
                return Err(e);
            }
        };

        match state.store_mut().apply_detail(ticket, detail) {
            DetailApply::Applied => {
                drop(state);
                self.ctx.events.publish(ClientEvent::DetailSelected { id });
                Ok(SyncOutcome::Applied)
            }
            DetailApply::Superseded => {
                tracing::debug!(target: "dataset_sync", id, "Detail response superseded");
                Ok(SyncOutcome::Stale)
            }
        }
    }

    /// Makes `detail` current without a fetch, superseding in-flight selections.
    pub(crate) async fn set_current(&self, epoch: Epoch, detail: DatasetDetail) -> bool {
        let id = detail.id;
        {
            let mut state = self.ctx.state.write().await;
            if !state.is_current(epoch) {
                return false;
            }
            state.store_mut().set_current(detail);
        }
        self.ctx.events.publish(ClientEvent::DetailSelected { id });
        true
    }

    /// Downloads the report of the current detail into the download directory.
    pub async fn download_report(&self) -> Result<PathBuf> {
        let (token, id, name) = {
            let state = self.ctx.state.read().await;
            let (token, _) = state.authorization().ok_or(ClientError::Unauthorized)?;
            let detail = state
                .store()
                .current()
                .ok_or_else(|| ClientError::validation(NO_DATASET_SELECTED))?;
            (token, detail.id, detail.name.clone())
        };

        let bytes = self.ctx.api.generate_report(&token, id).await?;

        let dir = self.download_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(report_file_name(&name));
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(target: "dataset_sync", id, path = %path.display(), size = bytes.len(), "Report saved");
        self.ctx.events.publish(ClientEvent::ReportSaved { path: path.clone() });
        Ok(path)
    }

    /// Falls back to the working directory; front-ends resolve the platform
    /// download directory into the config before creating the client.
    fn download_dir(&self) -> PathBuf {
        self.ctx
            .config
            .download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    async fn background_failure(&self, e: ClientError, epoch: Epoch, what: &str) -> SyncOutcome {
        if e.is_unauthorized() {
            tracing::warn!(target: "dataset_sync", "{}: token rejected, ending session", what);
            if let Err(storage) = self.ctx.end_session(EndReason::Expired, Some(epoch)).await {
                tracing::warn!(target: "dataset_sync", error = %storage, "Failed to clear expired session");
            }
            return SyncOutcome::Failed;
        }

        tracing::warn!(target: "dataset_sync", error = %e, "{}", what);
        if self.ctx.state.read().await.is_current(epoch) {
            self.ctx.events.publish(ClientEvent::SyncFailed {
                message: e.user_message(),
            });
        }
        SyncOutcome::Failed
    }
}

#[async_trait]
impl SyncTarget for DatasetSync {
    async fn is_live(&self, epoch: Epoch) -> bool {
        self.ctx.state.read().await.is_current(epoch)
    }

    async fn tick(&self, epoch: Epoch) {
        self.refresh(Some(epoch)).await;
    }
}

/// `report_<name>`, with path separators in the name replaced by `_`.
pub fn report_file_name(dataset_name: &str) -> String {
    let safe: String = dataset_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("report_{}", safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("plant.csv"), "report_plant.csv");
        assert_eq!(report_file_name("../etc/passwd"), "report_.._etc_passwd");
        assert_eq!(report_file_name("a\\b.csv"), "report_a_b.csv");
    }
}
