//! ClientSession - the explicit context a front-end holds for one client.

use chrono::{DateTime, Utc};
use eqviz_core::api::AnalysisApi;
use eqviz_core::config::ClientConfig;
use eqviz_core::dataset::{DatasetDetail, DatasetSummary};
use eqviz_core::error::Result;
use eqviz_core::event::{ClientEvent, SchedulerState};
use eqviz_core::session::CredentialRepository;
use eqviz_core::upload::UploadState;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::context::ClientContext;
use crate::session::SessionManager;
use crate::sync::DatasetSync;
use crate::upload::UploadWorkflow;

/// Everything a front-end renders, captured at one point in time.
#[derive(Debug, Clone)]
pub struct ClientSnapshot {
    pub username: Option<String>,
    pub datasets: Vec<DatasetSummary>,
    pub current: Option<DatasetDetail>,
    pub last_update: Option<DateTime<Utc>>,
    pub scheduler: SchedulerState,
    pub auto_refresh: bool,
    pub upload: UploadState,
}

/// Wires the session manager, dataset sync, scheduler and upload workflow
/// around one shared context.
///
/// ```ignore
/// let client = ClientSession::create(config, api, credentials)?;
/// client.sessions().restore().await?;
/// let mut events = client.subscribe();
/// // ...
/// client.destroy().await;
/// ```
pub struct ClientSession {
    ctx: Arc<ClientContext>,
    sync: Arc<DatasetSync>,
    sessions: SessionManager,
    uploads: UploadWorkflow,
}

impl ClientSession {
    /// Validates `config` and builds the client. Nothing is fetched until a
    /// session is authenticated or restored.
    pub fn create(
        config: ClientConfig,
        api: Arc<dyn AnalysisApi>,
        credentials: Arc<dyn CredentialRepository>,
    ) -> Result<Self> {
        config.validate()?;

        let ctx = Arc::new(ClientContext::new(config, api, credentials));
        let sync = Arc::new(DatasetSync::new(Arc::clone(&ctx)));
        let sessions = SessionManager::new(Arc::clone(&ctx), Arc::clone(&sync));
        let uploads = UploadWorkflow::new(Arc::clone(&ctx), Arc::clone(&sync));

        Ok(Self {
            ctx,
            sync,
            sessions,
            uploads,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.ctx.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn datasets(&self) -> &DatasetSync {
        &self.sync
    }

    pub fn uploads(&self) -> &UploadWorkflow {
        &self.uploads
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.ctx.events.subscribe()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.ctx.scheduler.state()
    }

    pub fn auto_refresh(&self) -> bool {
        self.ctx.scheduler.is_enabled()
    }

    /// Turns periodic refresh on or off.
    ///
    /// Turning it off stops the timer immediately. Turning it on while
    /// authenticated restarts it; the first refresh comes one period later.
    pub async fn set_auto_refresh(&self, enabled: bool) {
        tracing::info!(target: "sync_scheduler", enabled, "Auto-refresh toggled");
        self.ctx.scheduler.set_enabled(enabled);
        if enabled {
            self.sessions.resume_scheduler().await;
        }
    }

    pub async fn snapshot(&self) -> ClientSnapshot {
        let state = self.ctx.state.read().await;
        let store = state.store();
        ClientSnapshot {
            username: state.session().map(|s| s.username.clone()),
            datasets: store.datasets().to_vec(),
            current: store.current().cloned(),
            last_update: store.last_update(),
            scheduler: self.ctx.scheduler.state(),
            auto_refresh: self.ctx.scheduler.is_enabled(),
            upload: self.uploads.state(),
        }
    }

    /// Stops the timer and discards in-memory state. The persisted session
    /// is kept so the next client can restore it.
    pub async fn destroy(&self) {
        self.ctx.teardown().await;
        tracing::debug!(target: "session", "Client destroyed");
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.ctx.scheduler.stop();
    }
}
