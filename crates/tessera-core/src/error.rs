//! Error types for tessera.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, storage, and input validation errors.
//! The [`SessionManager`](crate::SessionManager) converts all of them into
//! its boolean contract; they stay public for transport and store adapters.

use std::fmt;
use thiserror::Error;

/// The unified error type for tessera operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server refused the presented credentials.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (unexpected status, malformed body).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Secure store errors.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Input validation errors (blank credentials, bad URLs).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Short, stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport(_) => "transport",
            Error::Auth(_) => "auth",
            Error::Protocol(_) => "protocol",
            Error::Store(_) => "store",
            Error::InvalidInput(_) => "invalid_input",
        }
    }

    /// HTTP status code carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth(AuthError::Rejected { status }) => Some(*status),
            Error::Protocol(err) => err.status,
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// DNS resolution failed.
    #[error("DNS resolution failed: {host}")]
    Dns { host: String },

    /// TLS/SSL error.
    #[error("TLS error: {message}")]
    Tls { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server answered with an unauthorized/forbidden status.
    #[error("credentials rejected (HTTP {status})")]
    Rejected { status: u16 },

    /// No refresh token is held in memory or in the secure store.
    #[error("no refresh token available")]
    MissingRefreshToken,
}

/// Protocol-level errors: the server answered, but not as expected.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code, if the failure is tied to one.
    pub status: Option<u16>,
    /// Error message from the server or the decoder.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}", status)?,
            None => write!(f, "malformed response")?,
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// An unexpected status code.
    pub fn status(status: u16, message: Option<String>) -> Self {
        Self {
            status: Some(status),
            message,
        }
    }

    /// A success status whose body could not be decoded.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: Some(message.into()),
        }
    }
}

/// Secure store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The platform keychain reported an error.
    #[error("keychain error: {message}")]
    Keychain { message: String },

    /// Generic backend failure.
    #[error("store backend error: {message}")]
    Backend { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Username or password is empty or whitespace-only.
    #[error("username and password must not be blank")]
    BlankCredentials,

    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid endpoint path segment.
    #[error("invalid endpoint segment '{value}'")]
    EndpointSegment { value: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_server_answers_only() {
        let rejected = Error::from(AuthError::Rejected { status: 401 });
        assert_eq!(rejected.status(), Some(401));
        assert_eq!(rejected.kind(), "auth");

        let unexpected = Error::from(ProtocolError::status(500, None));
        assert_eq!(unexpected.status(), Some(500));

        let refused = Error::from(TransportError::Connection {
            message: "refused".into(),
        });
        assert_eq!(refused.status(), None);
        assert_eq!(refused.kind(), "transport");
    }

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::status(502, Some("bad gateway".into()));
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");

        let err = ProtocolError::malformed("missing field `accessToken`");
        assert_eq!(
            err.to_string(),
            "malformed response: missing field `accessToken`"
        );
    }
}
