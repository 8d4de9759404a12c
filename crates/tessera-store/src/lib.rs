//! tessera-store - Persistent secure stores for tessera sessions.
//!
//! Two [`SecureStore`](tessera_core::SecureStore) implementations:
//!
//! - [`FileStore`]: an owner-only JSON file, safe to share between processes.
//! - [`KeyringStore`]: the platform keychain.
//!
//! For tests and short-lived sessions, use
//! [`MemoryStore`](tessera_core::MemoryStore) from `tessera-core`.

mod file;
mod keychain;

pub use file::FileStore;
pub use keychain::{DEFAULT_SERVICE, KeyringStore};
