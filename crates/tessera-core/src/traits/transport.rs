//! HTTP transport trait.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{ProtocolError, TransportError};
use crate::tokens::AccessToken;

/// HTTP method of a [`TransportRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A request handed to a [`Transport`].
#[derive(Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    /// JSON body, sent with `Content-Type: application/json`.
    pub body: Option<serde_json::Value>,
    /// Access token sent as `Authorization: Bearer <token>`.
    pub bearer: Option<AccessToken>,
}

impl TransportRequest {
    /// A `GET` without body.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
            bearer: None,
        }
    }

    /// A `POST` with a JSON body.
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
            bearer: None,
        }
    }

    /// Attach a bearer token.
    pub fn with_bearer(mut self, token: AccessToken) -> Self {
        self.bearer = Some(token);
        self
    }
}

// Bodies carry passwords and refresh tokens.
impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body", &self.body.as_ref().map(|_| "[REDACTED]"))
            .field("bearer", &self.bearer)
            .finish()
    }
}

/// Status code and decoded JSON body of a response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// `None` when the body was empty or not JSON.
    pub body: Option<serde_json::Value>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Option<serde_json::Value>) -> Self {
        Self { status, body }
    }

    /// Returns true for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body into an explicit schema.
    ///
    /// Missing bodies and missing required fields are reported as
    /// [`ProtocolError::malformed`].
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let body = self
            .body
            .clone()
            .ok_or_else(|| ProtocolError::malformed("response body is empty or not JSON"))?;
        serde_json::from_value(body).map_err(|e| ProtocolError::malformed(e.to_string()))
    }

    /// Server-provided error message, if the body carries one.
    pub fn message(&self) -> Option<String> {
        let body = self.body.as_ref()?;
        ["message", "error", "title"]
            .iter()
            .find_map(|field| body.get(field).and_then(|v| v.as_str()))
            .map(str::to_string)
    }
}

/// An HTTP client capable of issuing JSON requests.
///
/// Implementations report network-level failures as [`TransportError`] and
/// every HTTP answer, whatever its status, as a [`TransportResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for the response.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
