//! Auth endpoint definitions and request/response types.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::tokens::{AccessToken, CredentialPair, DEFAULT_TOKEN_TYPE, RefreshToken};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// api/Auth/login
pub const LOGIN: &[&str] = &["api", "Auth", "login"];

/// api/Auth/refresh
pub const REFRESH: &[&str] = &["api", "Auth", "refresh"];

/// api/Auth/logout
pub const LOGOUT: &[&str] = &["api", "Auth", "logout"];

// ============================================================================
// Secure Store Keys
// ============================================================================

/// Store key of the persisted access token.
pub const ACCESS_TOKEN_KEY: &str = "auth.access_token";

/// Store key of the persisted refresh token.
pub const REFRESH_TOKEN_KEY: &str = "auth.refresh_token";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for login.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub user: &'a str,
    pub password: &'a str,
}

/// Request body for refresh and logout.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from login. All fields are required.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub token_type: String,
}

/// Response from refresh. `tokenType` may be omitted.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl LoginResponse {
    /// Convert into a credential pair, rejecting empty tokens.
    pub(crate) fn into_pair(self) -> Result<CredentialPair, ProtocolError> {
        ensure_present(&self.access_token, "accessToken")?;
        ensure_present(&self.refresh_token, "refreshToken")?;
        Ok(CredentialPair::new(
            AccessToken::new(self.access_token),
            Some(RefreshToken::new(self.refresh_token)),
            self.token_type,
            Some(self.expires_in),
        ))
    }
}

impl RefreshResponse {
    /// Convert into a credential pair, rejecting empty tokens.
    pub(crate) fn into_pair(self) -> Result<CredentialPair, ProtocolError> {
        ensure_present(&self.access_token, "accessToken")?;
        ensure_present(&self.refresh_token, "refreshToken")?;
        Ok(CredentialPair::new(
            AccessToken::new(self.access_token),
            Some(RefreshToken::new(self.refresh_token)),
            self.token_type.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
            Some(self.expires_in),
        ))
    }
}

fn ensure_present(value: &str, field: &str) -> Result<(), ProtocolError> {
    if value.trim().is_empty() {
        Err(ProtocolError::malformed(format!("field `{}` is empty", field)))
    } else {
        Ok(())
    }
}
