//! Interaction layer: talks to the analysis service over HTTP.

pub mod http_api;

pub use http_api::{HttpAnalysisApi, REPORT_FALLBACK_MESSAGE};
