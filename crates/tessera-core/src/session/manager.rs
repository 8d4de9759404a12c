//! The session lifecycle manager.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::Result;
use crate::credentials::Credentials;
use crate::endpoints::{
    self, ACCESS_TOKEN_KEY, LoginRequest, LoginResponse, REFRESH_TOKEN_KEY, RefreshResponse,
    RefreshTokenRequest,
};
use crate::error::{AuthError, Error, InvalidInputError, ProtocolError, StoreError};
use crate::tokens::{AccessToken, CredentialPair, DEFAULT_TOKEN_TYPE, RefreshToken};
use crate::traits::{EndpointResolver, SecureStore, Transport, TransportRequest, TransportResponse};

use super::state::{CredentialSnapshot, SessionState};

/// Owns the client side of an authenticated session.
///
/// The manager exchanges credentials for an access/refresh pair, keeps the
/// pair in memory, mirrors it into a [`SecureStore`], renews it on request,
/// and tears it down on logout. Lifecycle operations never fail with an
/// error: every rejection or transport fault is logged and collapses into
/// the boolean each operation returns.
///
/// # Thread Safety
///
/// Managers are cheap to clone (they use internal `Arc`) and are safe to
/// share across tasks. All operations are serialized by one lock that
/// covers the whole credential pair, including the time spent waiting on
/// the network, so concurrent callers never observe a half-updated pair.
///
/// # Example
///
/// ```no_run
/// use tessera_core::{ApiUrl, MemoryStore, SessionManager, Transport};
///
/// # async fn example(transport: impl Transport + 'static) -> Result<(), tessera_core::Error> {
/// let api = ApiUrl::new("https://erp.example.com")?;
/// let session = SessionManager::new(transport, api, MemoryStore::new());
///
/// if session.authenticate("alice", "hunter2").await {
///     let token = session.access_token().await;
///     assert!(token.is_some());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    transport: Arc<dyn Transport>,
    resolver: Arc<dyn EndpointResolver>,
    store: Arc<dyn SecureStore>,
    credentials: Mutex<Option<CredentialPair>>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a manager in the `Unauthenticated` state.
    ///
    /// The store is not read until a rehydration path needs it.
    pub fn new(
        transport: impl Transport + 'static,
        resolver: impl EndpointResolver + 'static,
        store: impl SecureStore + 'static,
    ) -> Self {
        Self::from_shared(Arc::new(transport), Arc::new(resolver), Arc::new(store))
    }

    /// Create a manager from collaborators already shared elsewhere.
    pub fn from_shared(
        transport: Arc<dyn Transport>,
        resolver: Arc<dyn EndpointResolver>,
        store: Arc<dyn SecureStore>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            inner: Arc::new(ManagerInner {
                transport,
                resolver,
                store,
                credentials: Mutex::new(None),
                state_tx,
            }),
        }
    }

    // ========================================================================
    // Lifecycle Operations
    // ========================================================================

    /// Exchange a username and password for a credential pair.
    ///
    /// Blank input is rejected before any request is made. Returns `true`
    /// only when the server issued a complete pair; a failed attempt leaves
    /// the current session untouched.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> bool {
        let credentials = Credentials::new(username, password);
        if credentials.validate().is_err() {
            debug!("Blank username or password, not contacting the server");
            return false;
        }

        let mut slot = self.inner.credentials.lock().await;

        match self.request_login(&credentials).await {
            Ok(pair) => {
                self.commit(&mut slot, Some(pair));
                if let Some(pair) = slot.as_ref() {
                    self.persist(pair).await;
                }
                info!("Authenticated");
                true
            }
            Err(err) => {
                log_failure("login", &err);
                false
            }
        }
    }

    /// Returns the in-memory access token, if authenticated.
    ///
    /// Never triggers a refresh or a network call. The returned `String` is
    /// a plain copy that is not zeroed on drop; use
    /// [`bearer_token`](Self::bearer_token) to keep that guarantee.
    pub async fn access_token(&self) -> Option<String> {
        let slot = self.inner.credentials.lock().await;
        slot.as_ref().map(|pair| pair.access_token().as_str().to_string())
    }

    /// Returns a copy of the in-memory access token that is zeroed on drop.
    pub async fn bearer_token(&self) -> Option<AccessToken> {
        let slot = self.inner.credentials.lock().await;
        slot.as_ref().map(|pair| pair.access_token().clone())
    }

    /// Exchange the refresh token for a new credential pair.
    ///
    /// The refresh token is taken from memory, or read once from the secure
    /// store when memory holds none. On success the whole pair is replaced
    /// with the server's answer. On failure the session is cleared, since a
    /// rejected refresh token leaves nothing to recover.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> bool {
        let mut slot = self.inner.credentials.lock().await;
        self.refresh_locked(&mut slot).await
    }

    /// Refresh only if `rejected` is still the current access token.
    ///
    /// Meant for request interceptors reacting to a 401: when several
    /// requests fail with the same token, the first caller refreshes and the
    /// others observe the new token and return `true` without a request.
    #[instrument(skip(self, rejected))]
    pub async fn refresh_if_current(&self, rejected: &str) -> bool {
        let mut slot = self.inner.credentials.lock().await;

        if let Some(pair) = slot.as_ref()
            && pair.access_token().as_str() != rejected
        {
            debug!("Access token already replaced by another caller");
            return true;
        }

        self.refresh_locked(&mut slot).await
    }

    /// End the session on the server and locally.
    ///
    /// Local credentials and both store keys are cleared whatever the
    /// server says. The result only reports whether server-side
    /// invalidation is guaranteed: `true` if there was no refresh token to
    /// invalidate or the server confirmed, `false` if the call failed or
    /// the secure store could not be read.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> bool {
        let mut slot = self.inner.credentials.lock().await;

        let confirmed = match self.current_refresh_token(slot.as_ref()).await {
            Ok(None) => {
                debug!("No refresh token held, skipping server-side logout");
                true
            }
            Ok(Some(refresh_token)) => match self.request_logout(&refresh_token).await {
                Ok(()) => true,
                Err(err) => {
                    log_failure("logout", &err);
                    false
                }
            },
            // A token may exist that the server still honors.
            Err(err) => {
                log_failure("logout", &err.into());
                false
            }
        };

        self.commit(&mut slot, None);
        self.purge_store().await;

        info!(confirmed, "Logged out");
        confirmed
    }

    /// Drop the session locally without contacting the server.
    #[instrument(skip(self))]
    pub async fn clear_session(&self) {
        let mut slot = self.inner.credentials.lock().await;
        self.commit(&mut slot, None);
        self.purge_store().await;
        info!("Session cleared");
    }

    /// Rehydrate the in-memory pair from the secure store.
    ///
    /// Adopts the stored tokens when both keys are present; a store holding
    /// only one of them is treated as corrupted and cleared. Never contacts
    /// the server. Returns whether the manager is authenticated afterwards.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> bool {
        let mut slot = self.inner.credentials.lock().await;
        if slot.is_some() {
            debug!("Session already held in memory");
            return true;
        }

        let store = &self.inner.store;
        let access = match store.get(ACCESS_TOKEN_KEY).await {
            Ok(value) => non_empty(value),
            Err(err) => {
                warn!(error = %err, "Failed to read access token from secure store");
                return false;
            }
        };
        let refresh = match store.get(REFRESH_TOKEN_KEY).await {
            Ok(value) => non_empty(value),
            Err(err) => {
                warn!(error = %err, "Failed to read refresh token from secure store");
                return false;
            }
        };

        match (access, refresh) {
            (Some(access), Some(refresh)) => {
                let pair = CredentialPair::new(
                    AccessToken::new(access),
                    Some(RefreshToken::new(refresh)),
                    DEFAULT_TOKEN_TYPE,
                    None,
                );
                self.commit(&mut slot, Some(pair));
                info!("Session restored from secure store");
                true
            }
            (None, None) => {
                debug!("No persisted session");
                false
            }
            _ => {
                error!("Secure store holds a partial credential pair, clearing it");
                self.purge_store().await;
                false
            }
        }
    }

    /// Install an externally obtained pair in memory.
    ///
    /// The secure store is not written. A pair with a blank access or
    /// refresh token is refused and the current session is kept. Returns
    /// whether the pair was adopted.
    pub async fn adopt(&self, pair: CredentialPair) -> bool {
        let blank_refresh = pair
            .refresh_token()
            .is_some_and(|token| token.as_str().trim().is_empty());
        if pair.access_token().as_str().trim().is_empty() || blank_refresh {
            warn!("Refusing to adopt a credential pair with a blank token");
            return false;
        }

        let mut slot = self.inner.credentials.lock().await;
        self.commit(&mut slot, Some(pair));
        debug!("Adopted credential pair");
        true
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    /// Returns the current session state.
    pub async fn state(&self) -> SessionState {
        let slot = self.inner.credentials.lock().await;
        SessionState::of(slot.as_ref())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state().await.is_authenticated()
    }

    /// Value for an `Authorization` header, e.g. `Bearer abc`.
    pub async fn authorization_header(&self) -> Option<String> {
        let slot = self.inner.credentials.lock().await;
        slot.as_ref().map(CredentialPair::authorization_header)
    }

    /// Token type, lifetime, and refresh availability of the current pair.
    pub async fn credentials(&self) -> Option<CredentialSnapshot> {
        let slot = self.inner.credentials.lock().await;
        slot.as_ref().map(CredentialSnapshot::from)
    }

    /// Subscribe to session state changes.
    ///
    /// The receiver starts with the current state and is notified only when
    /// the state flips.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn refresh_locked(&self, slot: &mut Option<CredentialPair>) -> bool {
        let refresh_token = match self.current_refresh_token(slot.as_ref()).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                log_failure("refresh", &AuthError::MissingRefreshToken.into());
                return false;
            }
            Err(err) => {
                log_failure("refresh", &err.into());
                return false;
            }
        };

        match self.request_refresh(&refresh_token).await {
            Ok(pair) => {
                self.commit(slot, Some(pair));
                if let Some(pair) = slot.as_ref() {
                    self.persist(pair).await;
                }
                info!("Session refreshed");
                true
            }
            Err(err) => {
                log_failure("refresh", &err);
                self.commit(slot, None);
                self.purge_store().await;
                false
            }
        }
    }

    /// Refresh token from memory, falling back to one store read.
    ///
    /// A failed read is reported, not treated as "no token".
    async fn current_refresh_token(
        &self,
        pair: Option<&CredentialPair>,
    ) -> std::result::Result<Option<RefreshToken>, StoreError> {
        if let Some(token) = pair.and_then(CredentialPair::refresh_token) {
            return Ok(Some(token.clone()));
        }

        let stored = self.inner.store.get(REFRESH_TOKEN_KEY).await?;
        let token = non_empty(stored).map(RefreshToken::new);
        if token.is_some() {
            debug!("Using refresh token from secure store");
        }
        Ok(token)
    }

    async fn request_login(&self, credentials: &Credentials) -> Result<CredentialPair> {
        let body = to_body(&LoginRequest {
            user: credentials.username(),
            password: credentials.password(),
        })?;
        let response = self.post(endpoints::LOGIN, body).await?;
        expect_status(&response, &[200])?;
        Ok(response.json::<LoginResponse>()?.into_pair()?)
    }

    async fn request_refresh(&self, refresh_token: &RefreshToken) -> Result<CredentialPair> {
        let body = to_body(&RefreshTokenRequest {
            refresh_token: refresh_token.as_str(),
        })?;
        let response = self.post(endpoints::REFRESH, body).await?;
        expect_status(&response, &[200])?;
        Ok(response.json::<RefreshResponse>()?.into_pair()?)
    }

    async fn request_logout(&self, refresh_token: &RefreshToken) -> Result<()> {
        let body = to_body(&RefreshTokenRequest {
            refresh_token: refresh_token.as_str(),
        })?;
        let response = self.post(endpoints::LOGOUT, body).await?;
        expect_status(&response, &[200, 204])
    }

    async fn post(&self, segments: &[&str], body: serde_json::Value) -> Result<TransportResponse> {
        let url = self.inner.resolver.resolve(segments)?;
        debug!(%url, "Sending auth request");

        let response = self
            .inner
            .transport
            .send(TransportRequest::post(url, body))
            .await?;

        trace!(status = response.status, "Auth response");
        Ok(response)
    }

    /// Replace the pair and publish the derived state.
    fn commit(&self, slot: &mut Option<CredentialPair>, pair: Option<CredentialPair>) {
        *slot = pair;
        let state = SessionState::of(slot.as_ref());
        self.inner.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    /// Mirror both tokens into the store, or neither.
    ///
    /// The old refresh token is removed before the new access token is
    /// written, so an interrupted write leaves a partial pair that
    /// [`restore`](Self::restore) discards, never a mismatched one.
    async fn persist(&self, pair: &CredentialPair) {
        let Some(refresh_token) = pair.refresh_token() else {
            self.purge_store().await;
            return;
        };

        let store = &self.inner.store;
        let written = async {
            store.remove(REFRESH_TOKEN_KEY).await?;
            store
                .set(ACCESS_TOKEN_KEY, pair.access_token().as_str())
                .await?;
            store.set(REFRESH_TOKEN_KEY, refresh_token.as_str()).await
        }
        .await;

        if let Err(err) = written {
            error!(error = %err, "Failed to persist credentials, clearing secure store");
            self.purge_store().await;
        }
    }

    async fn purge_store(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.inner.store.remove(key).await {
                error!(key, error = %err, "Failed to remove credential from secure store");
            }
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.inner.state_tx.borrow())
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

fn to_body<T: serde::Serialize>(body: &T) -> Result<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| {
        Error::InvalidInput(InvalidInputError::Other {
            message: e.to_string(),
        })
    })
}

fn expect_status(response: &TransportResponse, accepted: &[u16]) -> Result<()> {
    match response.status {
        status if accepted.contains(&status) => Ok(()),
        status @ (401 | 403) => Err(AuthError::Rejected { status }.into()),
        status => Err(ProtocolError::status(status, response.message()).into()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn log_failure(operation: &'static str, err: &Error) {
    match err {
        Error::Auth(_) => {
            warn!(operation, status = ?err.status(), error = %err, "Server rejected auth request")
        }
        Error::Transport(_) => {
            warn!(operation, error = %err, "Auth request did not reach the server")
        }
        Error::Store(_) => {
            warn!(operation, error = %err, "Secure store unavailable")
        }
        _ => warn!(
            operation,
            kind = err.kind(),
            status = ?err.status(),
            error = %err,
            "Auth request failed"
        ),
    }
}
