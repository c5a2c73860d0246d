//! Synchronization of the local dataset view with the service.

mod dataset_sync;
mod scheduler;

pub use dataset_sync::{DatasetSync, SyncOutcome, report_file_name};
pub use scheduler::{SyncScheduler, SyncTarget};
