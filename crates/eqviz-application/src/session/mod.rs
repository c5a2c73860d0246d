//! Session lifecycle: authentication, restore and logout.

mod manager;

pub use manager::SessionManager;
