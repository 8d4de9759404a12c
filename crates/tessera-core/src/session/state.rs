//! Session state and read-only views of the credential pair.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::tokens::CredentialPair;

/// Whether a usable access token is currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated,
}

impl SessionState {
    /// Derive the state from the credential slot.
    pub(crate) fn of(pair: Option<&CredentialPair>) -> Self {
        match pair {
            Some(_) => SessionState::Authenticated,
            None => SessionState::Unauthenticated,
        }
    }

    pub fn is_authenticated(self) -> bool {
        self == SessionState::Authenticated
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unauthenticated => f.write_str("unauthenticated"),
            SessionState::Authenticated => f.write_str("authenticated"),
        }
    }
}

/// Metadata of the current credential pair, safe to log or display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSnapshot {
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub has_refresh_token: bool,
}

impl From<&CredentialPair> for CredentialSnapshot {
    fn from(pair: &CredentialPair) -> Self {
        Self {
            token_type: pair.token_type().to_string(),
            expires_in: pair.expires_in(),
            issued_at: pair.issued_at(),
            expires_at: pair.expires_at(),
            has_refresh_token: pair.refresh_token().is_some(),
        }
    }
}
