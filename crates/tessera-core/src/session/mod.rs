//! Session lifecycle management.
//!
//! The [`SessionManager`] is the sole owner of the in-memory credential pair
//! and the sole writer of the `auth.*` keys in the secure store.

mod manager;
mod state;

pub use manager::SessionManager;
pub use state::{CredentialSnapshot, SessionState};
