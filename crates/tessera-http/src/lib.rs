//! tessera-http - reqwest transport for tessera sessions.
//!
//! Provides [`HttpTransport`], the production [`Transport`] for
//! [`SessionManager`], and [`ClientConfig`] for loading the API location and
//! client settings from code, the environment, or a host config file.
//!
//! # Example
//!
//! ```no_run
//! use tessera_core::MemoryStore;
//! use tessera_http::ClientConfig;
//!
//! # async fn example() -> Result<(), tessera_core::Error> {
//! let config = ClientConfig::from_env()?;
//! let session = tessera_http::connect(&config, MemoryStore::new())?;
//!
//! if session.authenticate("alice", "hunter2").await {
//!     println!("{:?}", session.authorization_header().await);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod transport;

pub use config::{
    ClientConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ENV_API_URL, ENV_TIMEOUT_SECS,
    ENV_USER_AGENT,
};
pub use transport::HttpTransport;

use tessera_core::{SecureStore, SessionManager};

/// Build a [`SessionManager`] talking HTTP to `config.base_url`.
pub fn connect(
    config: &ClientConfig,
    store: impl SecureStore + 'static,
) -> tessera_core::Result<SessionManager> {
    let transport = HttpTransport::from_config(config)?;
    Ok(SessionManager::new(transport, config.base_url.clone(), store))
}

