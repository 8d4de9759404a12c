//! tessera-core - Client-side session lifecycle for bearer-token APIs.
//!
//! This crate provides the [`SessionManager`], which exchanges a username and
//! password for an access/refresh token pair, caches the pair in memory,
//! mirrors it into a [`SecureStore`], renews it on demand, and tears it down
//! on logout. The HTTP client, endpoint resolution, and persistence are
//! injected through the [`Transport`], [`EndpointResolver`], and
//! [`SecureStore`] traits.
//!
//! # Example
//!
//! ```no_run
//! use tessera_core::{ApiUrl, MemoryStore, SessionManager, Transport};
//!
//! # async fn example(transport: impl Transport + 'static) -> Result<(), tessera_core::Error> {
//! let api = ApiUrl::new("https://erp.example.com")?;
//! let session = SessionManager::new(transport, api, MemoryStore::new());
//!
//! if !session.authenticate("alice", "hunter2").await {
//!     eprintln!("login failed");
//! }
//!
//! // After an API call came back with 401:
//! if !session.refresh_token().await {
//!     eprintln!("session expired, please log in again");
//! }
//!
//! session.logout().await;
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod session;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::Error;
pub use session::{CredentialSnapshot, SessionManager, SessionState};
pub use store::MemoryStore;
pub use tokens::{AccessToken, CredentialPair, RefreshToken};
pub use traits::{
    EndpointResolver, Method, SecureStore, Transport, TransportRequest, TransportResponse,
};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
