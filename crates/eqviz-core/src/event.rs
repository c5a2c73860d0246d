use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dataset::DatasetId;
use crate::session::EndReason;
use crate::upload::UploadPhase;

/// Whether the periodic synchronization timer is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Discrete state changes published by the client.
///
/// The view layer subscribes to these instead of polling the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    SessionStarted {
        username: String,
    },
    SessionEnded {
        reason: EndReason,
    },
    ListRefreshed {
        count: usize,
        updated_at: DateTime<Utc>,
    },
    DetailSelected {
        id: DatasetId,
    },
    /// A background synchronization failed; the previous view is kept.
    SyncFailed {
        message: String,
    },
    SchedulerChanged {
        state: SchedulerState,
    },
    UploadChanged {
        phase: UploadPhase,
    },
    ReportSaved {
        path: PathBuf,
    },
}
