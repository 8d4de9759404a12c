//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use tessera_core::ApiUrl;
use tessera_core::error::{Error, InvalidInputError};

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "TESSERA_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "TESSERA_TIMEOUT_SECS";

/// Environment variable overriding the user agent.
pub const ENV_USER_AGENT: &str = "TESSERA_USER_AGENT";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent used when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("tessera/", env!("CARGO_PKG_VERSION"));

/// Settings for [`HttpTransport`](crate::HttpTransport) and [`connect`](crate::connect).
///
/// Deserializes from a host config section such as:
///
/// ```toml
/// base_url = "https://erp.example.com"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub base_url: ApiUrl,
    #[serde(
        rename = "timeout_secs",
        default = "default_timeout",
        deserialize_with = "seconds"
    )]
    pub timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Load the configuration from `TESSERA_*` environment variables.
    ///
    /// `TESSERA_API_URL` is required; the timeout and user agent fall back to
    /// their defaults when unset.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_URL).ok_or_else(|| {
            Error::InvalidInput(InvalidInputError::Other {
                message: format!("{} is not set", ENV_API_URL),
            })
        })?;
        let mut config = Self::new(ApiUrl::new(base_url)?);

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                Error::InvalidInput(InvalidInputError::Other {
                    message: format!(
                        "{} must be a whole number of seconds, got '{}'",
                        ENV_TIMEOUT_SECS, raw
                    ),
                })
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(user_agent) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            config.user_agent = user_agent;
        }

        Ok(config)
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}
