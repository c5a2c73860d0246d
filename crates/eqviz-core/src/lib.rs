//! Domain layer of the equipment analytics client.
//!
//! Holds the models returned by the analysis service, the dataset store and
//! its request-ordering rules, the upload state machine, the repository and
//! API traits implemented by the outer layers, and the view derivations.

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod event;
pub mod session;
pub mod upload;
pub mod view;

pub use error::{ClientError, Result};
