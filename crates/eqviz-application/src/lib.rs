//! Application layer: the session lifecycle, background synchronization
//! and the upload workflow, wired together by [`ClientSession`].

pub mod client_session;
mod context;
pub mod events;
pub mod session;
pub mod state;
pub mod sync;
pub mod upload;

pub use client_session::{ClientSession, ClientSnapshot};
pub use events::EventBus;
pub use session::SessionManager;
pub use state::Epoch;
pub use sync::{DatasetSync, SyncOutcome, SyncScheduler};
pub use upload::UploadWorkflow;
