use eqviz_core::api::AuthResponse;
use eqviz_core::error::{ClientError, Result};
use eqviz_core::event::ClientEvent;
use eqviz_core::session::{
    AuthMode, Credentials, EndReason, MISSING_CREDENTIALS, Session, TOKEN_KEY, USERNAME_KEY,
};
use std::sync::Arc;

use crate::context::ClientContext;
use crate::state::Epoch;
use crate::sync::{DatasetSync, SyncTarget};

/// Owns the authenticated identity and its persisted form.
///
/// `SessionManager` is responsible for:
/// - Logging in and registering
/// - Restoring the persisted session at startup
/// - Logging out, which clears the store and stops the scheduler
///
/// It is the only writer of the persisted token/username pair.
pub struct SessionManager {
    ctx: Arc<ClientContext>,
    sync: Arc<DatasetSync>,
}

impl SessionManager {
    pub(crate) fn new(ctx: Arc<ClientContext>, sync: Arc<DatasetSync>) -> Self {
        Self { ctx, sync }
    }

    /// Logs in or registers, then runs the initial synchronization.
    ///
    /// # Errors
    ///
    /// - `Validation` when username or password is blank (nothing is sent)
    /// - `Auth` with the service's message or the generic fallback
    ///
    /// A failed attempt leaves any existing session untouched.
    pub async fn authenticate(&self, mode: AuthMode, credentials: &Credentials) -> Result<Session> {
        if !credentials.is_complete() {
            return Err(ClientError::validation(MISSING_CREDENTIALS));
        }

        let response = match mode {
            AuthMode::Login => self.ctx.api.login(credentials).await,
            AuthMode::Register => self.ctx.api.register(credentials).await,
        };
        let AuthResponse {
            token, username, ..
        } = response.inspect_err(|e| {
            tracing::info!(target: "session", mode = %mode, error = %e, "Authentication failed");
        })?;

        let session = Session::new(username, token);
        self.persist(&session).await;

        tracing::info!(target: "session", mode = %mode, username = %session.username, "Authenticated");
        self.activate(session.clone()).await;
        Ok(session)
    }

    /// Reconstructs the session persisted by an earlier run.
    ///
    /// Both fields must be present; a lone token or username is treated as
    /// absent and removed.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let token = non_empty(self.ctx.credentials.get(TOKEN_KEY).await?);
        let username = non_empty(self.ctx.credentials.get(USERNAME_KEY).await?);

        match (token, username) {
            (Some(token), Some(username)) => {
                let session = Session::new(username, token);
                tracing::info!(target: "session", username = %session.username, "Restored session");
                self.activate(session.clone()).await;
                Ok(Some(session))
            }
            (None, None) => Ok(None),
            (token, _) => {
                let orphan = if token.is_some() { TOKEN_KEY } else { USERNAME_KEY };
                tracing::warn!(target: "session", orphan, "Partially persisted session, starting unauthenticated");
                self.ctx.forget_credentials().await?;
                Ok(None)
            }
        }
    }

    /// Ends the session, stops the scheduler and clears the store and the
    /// persisted pair. Safe to call when not logged in.
    pub async fn logout(&self) -> Result<()> {
        self.ctx.end_session(EndReason::Logout, None).await?;
        Ok(())
    }

    pub async fn current(&self) -> Option<Session> {
        self.ctx.state.read().await.session().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.ctx.state.read().await.is_authenticated()
    }

    /// Starts the timer for the active session if auto-refresh is on.
    pub(crate) async fn resume_scheduler(&self) -> bool {
        let epoch = {
            let state = self.ctx.state.read().await;
            if !state.is_authenticated() {
                return false;
            }
            state.epoch()
        };
        self.start_scheduler(epoch).await
    }

    async fn persist(&self, session: &Session) {
        let stored = async {
            self.ctx.credentials.set(TOKEN_KEY, session.token()).await?;
            self.ctx
                .credentials
                .set(USERNAME_KEY, &session.username)
                .await
        }
        .await;
        if let Err(e) = stored {
            // The session still works for this run; restore() discards a half-written pair.
            tracing::warn!(target: "session", error = %e, "Failed to persist session");
        }
    }

    async fn activate(&self, session: Session) {
        let username = session.username.clone();
        self.ctx.scheduler.stop();
        let (epoch, previous) = self.ctx.state.write().await.start_session(session);

        if let Some(previous) = previous {
            if previous.username != username {
                self.ctx.events.publish(ClientEvent::SessionEnded {
                    reason: EndReason::Replaced,
                });
            }
        }
        self.ctx.events.publish(ClientEvent::SessionStarted { username });

        self.sync.refresh_list().await;
        self.start_scheduler(epoch).await;
    }

    /// Starts the timer unless session `epoch` has ended in the meantime.
    ///
    /// The read lock is held across `start`; `end_session` stops the timer
    /// under the write lock, so a timer is never left running for an ended
    /// session.
    async fn start_scheduler(&self, epoch: Epoch) -> bool {
        let state = self.ctx.state.read().await;
        if !state.is_authenticated() || !state.is_current(epoch) {
            tracing::debug!(target: "sync_scheduler", epoch, "Session ended before the timer started");
            return false;
        }
        let target: Arc<dyn SyncTarget> = self.sync.clone();
        self.ctx.scheduler.start(target, epoch)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
