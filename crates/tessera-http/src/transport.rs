//! reqwest implementation of [`Transport`].

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use tracing::{debug, instrument, trace};

use tessera_core::error::{Error, TransportError};
use tessera_core::{Method, Transport, TransportRequest, TransportResponse};

use crate::config::{ClientConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

/// HTTP client for auth requests.
///
/// Every answer from the server is returned as a [`TransportResponse`],
/// whatever its status. Only failures to obtain an answer are errors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the default timeout and user agent.
    pub fn new() -> Result<Self, Error> {
        Self::build(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a transport honoring the timeout and user agent of `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        Self::build(config.timeout, &config.user_agent)
    }

    /// Wrap an existing client.
    ///
    /// `timeout` is only used to report [`TransportError::Timeout`]; the
    /// client's own settings govern the request.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn build(timeout: Duration, user_agent: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| map_reqwest(e, timeout))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        }
        .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!("HTTP request");
        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest(e, self.timeout))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_reqwest(e, self.timeout))?;
        trace!(status, len = bytes.len(), "HTTP response");

        Ok(TransportResponse::new(status, decode_body(&bytes)))
    }
}

/// Empty and non-JSON bodies decode to `None`.
fn decode_body(bytes: &[u8]) -> Option<serde_json::Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

fn map_reqwest(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout {
            duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        };
    }

    let chain = source_chain(&err);
    if err.is_connect() {
        if chain.contains("dns error") {
            return TransportError::Dns {
                host: err
                    .url()
                    .and_then(|u| u.host_str())
                    .unwrap_or_default()
                    .to_string(),
            };
        }
        if chain.contains("certificate") || chain.contains("tls") {
            return TransportError::Tls { message: chain };
        }
        return TransportError::Connection { message: chain };
    }

    TransportError::Http { message: chain }
}

fn source_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_non_json_bodies_are_none() {
        assert!(decode_body(b"").is_none());
        assert!(decode_body(b"  \n").is_none());
        assert!(decode_body(b"<html>Bad Gateway</html>").is_none());
        assert_eq!(
            decode_body(br#"{"message":"nope"}"#),
            Some(serde_json::json!({"message": "nope"}))
        );
    }

    #[test]
    fn transport_creation() {
        let config = ClientConfig::new(tessera_core::ApiUrl::new("https://erp.example.com").unwrap())
            .with_timeout(Duration::from_secs(3));
        let transport = HttpTransport::from_config(&config).unwrap();
        assert_eq!(transport.timeout, Duration::from_secs(3));
    }
}
