//! Dataset domain module.
//!
//! - `model`: summaries, details and equipment records as sent by the service
//! - `store`: `DatasetStore`, the client-side view of the service state

mod model;
mod store;

pub use model::{DatasetDetail, DatasetId, DatasetSummary, EquipmentRecord, EquipmentTypeCounts};
pub use store::{DatasetStore, DetailApply, DetailTicket, ListApply, ListTicket, RequestId};
