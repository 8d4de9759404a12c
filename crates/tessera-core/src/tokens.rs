//! Bearer token types and the credential pair.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use zeroize::Zeroize;

/// Token type assumed when the server does not report one.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// A short-lived access token for authenticated API requests.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Zeroed in memory when dropped
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

impl Drop for AccessToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// A longer-lived token exchanged for a new access/refresh pair.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Zeroed in memory when dropped
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh and logout requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

impl Drop for RefreshToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// The access/refresh pair issued by a single server response.
///
/// A pair is always replaced wholesale; its fields are never updated
/// individually.
#[derive(Debug, Clone)]
pub struct CredentialPair {
    access_token: AccessToken,
    refresh_token: Option<RefreshToken>,
    token_type: String,
    expires_in: Option<u64>,
    issued_at: DateTime<Utc>,
}

impl CredentialPair {
    /// Create a pair issued now.
    pub fn new(
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
        token_type: impl Into<String>,
        expires_in: Option<u64>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: token_type.into(),
            expires_in,
            issued_at: Utc::now(),
        }
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Lifetime in seconds as reported by the server at issuance.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    /// Local time at which the pair was received.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Estimated expiry of the access token, if the server reported a lifetime.
    ///
    /// Informational only; the session manager never acts on it.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expires_in?).ok()?;
        Some(self.issued_at + Duration::seconds(secs))
    }

    /// Value for an `Authorization` header, e.g. `Bearer abc`.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token.as_str())
    }
}
