//! Session and dataset state shared by every component of a client.

use eqviz_core::dataset::DatasetStore;
use eqviz_core::session::Session;

/// Generation counter of the active session.
///
/// Bumped whenever a session starts or ends. A request remembers the epoch
/// it was issued under and its result is applied only if the epoch is
/// still current.
pub type Epoch = u64;

/// Session and store live under one lock so the stale-session check and
/// the store write happen atomically.
#[derive(Debug, Default)]
pub struct ClientState {
    session: Option<Session>,
    epoch: Epoch,
    store: DatasetStore,
}

impl ClientState {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// `true` while the session that issued a request under `epoch` is active.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.session.is_some() && self.epoch == epoch
    }

    /// Token and epoch to issue an authenticated request with.
    pub fn authorization(&self) -> Option<(String, Epoch)> {
        self.session
            .as_ref()
            .map(|session| (session.token().to_string(), self.epoch))
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DatasetStore {
        &mut self.store
    }

    /// Activates `session` and returns its epoch together with the session
    /// it replaced, if any.
    ///
    /// The store is cleared when the previous session belonged to another user.
    pub fn start_session(&mut self, session: Session) -> (Epoch, Option<Session>) {
        let previous = self.session.take();
        if previous
            .as_ref()
            .is_some_and(|p| p.username != session.username)
        {
            self.store.clear();
        }
        self.session = Some(session);
        self.epoch += 1;
        (self.epoch, previous)
    }

    /// Drops the session and everything fetched with it.
    pub fn end_session(&mut self) -> Option<Session> {
        let previous = self.session.take();
        self.epoch += 1;
        self.store.clear();
        previous
    }
}
