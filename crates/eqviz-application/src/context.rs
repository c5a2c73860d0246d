//! The explicit context object every component of a client shares.

use eqviz_core::api::AnalysisApi;
use eqviz_core::config::ClientConfig;
use eqviz_core::error::Result;
use eqviz_core::event::ClientEvent;
use eqviz_core::session::{CredentialRepository, EndReason, TOKEN_KEY, USERNAME_KEY};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::events::EventBus;
use crate::state::{ClientState, Epoch};
use crate::sync::SyncScheduler;

pub struct ClientContext {
    pub(crate) config: ClientConfig,
    pub(crate) api: Arc<dyn AnalysisApi>,
    pub(crate) credentials: Arc<dyn CredentialRepository>,
    pub(crate) state: RwLock<ClientState>,
    pub(crate) events: EventBus,
    pub(crate) scheduler: SyncScheduler,
}

impl ClientContext {
    pub(crate) fn new(
        config: ClientConfig,
        api: Arc<dyn AnalysisApi>,
        credentials: Arc<dyn CredentialRepository>,
    ) -> Self {
        let events = EventBus::new();
        let scheduler =
            SyncScheduler::new(config.refresh_interval(), config.auto_refresh, events.clone());
        Self {
            config,
            api,
            credentials,
            state: RwLock::new(ClientState::default()),
            events,
            scheduler,
        }
    }

    /// Ends the active session: stops the timer, clears session and store,
    /// removes the persisted pair and publishes `SessionEnded`.
    ///
    /// With `only_epoch` set, nothing happens unless that session is still
    /// the active one. Returns whether a session was ended.
    pub(crate) async fn end_session(
        &self,
        reason: EndReason,
        only_epoch: Option<Epoch>,
    ) -> Result<bool> {
        let ended = {
            let mut state = self.state.write().await;
            if only_epoch.is_some_and(|epoch| !state.is_current(epoch)) {
                return Ok(false);
            }
            self.scheduler.stop();
            state.end_session()
        };

        let removed = self.forget_credentials().await;

        let Some(session) = ended else {
            return removed.map(|_| false);
        };

        tracing::info!(target: "session", username = %session.username, reason = ?reason, "Session ended");
        self.events.publish(ClientEvent::SessionEnded { reason });
        removed.map(|_| true)
    }

    /// Removes both persisted fields, attempting the second even if the first fails.
    pub(crate) async fn forget_credentials(&self) -> Result<()> {
        let token = self.credentials.remove(TOKEN_KEY).await;
        let username = self.credentials.remove(USERNAME_KEY).await;
        if let Err(e) = token.as_ref().and(username.as_ref()) {
            tracing::warn!(target: "session", error = %e, "Failed to remove persisted credentials");
        }
        token.and(username)
    }

    /// Stops the timer and invalidates in-flight requests without touching
    /// persisted state, so the session can be restored by the next client.
    pub(crate) async fn teardown(&self) {
        let mut state = self.state.write().await;
        self.scheduler.stop();
        if state.end_session().is_some() {
            tracing::debug!(target: "session", "Client torn down with an active session");
        }
    }
}
