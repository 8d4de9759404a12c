//! Login credentials type.

use std::fmt;

use zeroize::Zeroize;

use crate::error::InvalidInputError;

/// Username and password presented to the login endpoint.
///
/// # Security
///
/// The password is never exposed in Debug output and is zeroed on drop.
///
/// # Example
///
/// ```
/// use tessera_core::Credentials;
///
/// let creds = Credentials::new("alice", "hunter2");
/// assert_eq!(creds.username(), "alice");
/// assert!(!creds.is_blank());
/// ```
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing the login request body.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Returns true if either field is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.username.trim().is_empty() || self.password.trim().is_empty()
    }

    /// Fails with [`InvalidInputError::BlankCredentials`] when [`is_blank`](Self::is_blank).
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if self.is_blank() {
            Err(InvalidInputError::BlankCredentials)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}
