//! API base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};
use crate::traits::EndpointResolver;

/// A validated API base URL.
///
/// Network URLs must use HTTPS, or HTTP for loopback hosts (local
/// development and tests). `ApiUrl` is also the default
/// [`EndpointResolver`]: logical path segments are appended to the base
/// path, each one percent-encoded.
///
/// # Example
///
/// ```
/// use tessera_core::{ApiUrl, EndpointResolver};
///
/// let api = ApiUrl::new("https://erp.example.com").unwrap();
/// assert_eq!(
///     api.resolve(&["api", "Auth", "login"]).unwrap(),
///     "https://erp.example.com/api/Auth/login"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiUrl(Url);

impl ApiUrl {
    /// Create a new API URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::ApiUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns true if the host is a loopback address or `localhost`.
    pub fn is_loopback(&self) -> bool {
        match self.0.host() {
            Some(url::Host::Domain(domain)) => domain == "localhost",
            Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        }
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        let invalid = |reason: &str| InvalidInputError::ApiUrl {
            value: original.to_string(),
            reason: reason.to_string(),
        };

        if url.cannot_be_a_base() || url.host().is_none() {
            return Err(invalid("URL must have a host").into());
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("URL must not carry a query or fragment").into());
        }

        match url.scheme() {
            "https" => Ok(()),
            "http" => {
                let loopback = Self(url.clone()).is_loopback();
                if loopback {
                    Ok(())
                } else {
                    Err(invalid("HTTP is only allowed for localhost").into())
                }
            }
            other => Err(invalid(&format!("unsupported scheme '{}'", other)).into()),
        }
    }
}

impl EndpointResolver for ApiUrl {
    fn resolve(&self, segments: &[&str]) -> Result<String, Error> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(InvalidInputError::EndpointSegment {
                value: bad.to_string(),
            }
            .into());
        }

        let mut url = self.0.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| InvalidInputError::Other {
                message: format!("'{}' cannot be used as a base URL", self.0),
            })?;
            // Drop the trailing empty segment of "https://host/" or "https://host/base/".
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url.into())
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str().trim_end_matches('/'))
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ApiUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
