//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: `Session`, `Credentials`, `AuthMode`, `EndReason`
//! - `repository`: `CredentialRepository`, the persisted token/username pair

mod model;
mod repository;

pub use model::{
    AuthMode, Credentials, EndReason, MISSING_CREDENTIALS, Session, authorization_header,
};
pub use repository::{CredentialRepository, TOKEN_KEY, USERNAME_KEY};
