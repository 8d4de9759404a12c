#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use tessera_core::error::{StoreError, TransportError};
use tessera_core::{
    ApiUrl, MemoryStore, SecureStore, SessionManager, Transport, TransportRequest,
    TransportResponse,
};

pub const API: &str = "https://erp.example.com";

/// What the scripted server does for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, Option<Value>),
    /// 200 with `access-N` / `refresh-N`, N counting refresh requests.
    Rotate,
    ConnectionRefused,
    /// Never answers.
    Hang,
}

impl Reply {
    pub fn tokens(access: &str, refresh: &str) -> Self {
        Reply::Status(
            200,
            Some(json!({
                "accessToken": access,
                "refreshToken": refresh,
                "expiresIn": 900,
                "tokenType": "Bearer"
            })),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Script {
    replies: HashMap<&'static str, VecDeque<Reply>>,
    requests: Vec<RecordedRequest>,
    rotations: usize,
}

/// In-process transport answering auth endpoints from a script.
///
/// Replies are consumed in order per endpoint; the last one is repeated.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue a reply for `login`, `refresh`, or `logout`.
    pub fn on(&self, endpoint: &'static str, reply: Reply) -> &Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .entry(endpoint)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<RecordedRequest> {
        let suffix = format!("/api/Auth/{}", endpoint);
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(&suffix))
            .collect()
    }

    fn next_reply(&self, request: &TransportRequest) -> Reply {
        let mut script = self.script.lock().unwrap();
        script.requests.push(RecordedRequest {
            url: request.url.clone(),
            body: request.body.clone(),
        });

        let endpoint = request.url.rsplit('/').next().unwrap_or_default().to_string();
        let reply = script
            .replies
            .iter_mut()
            .find(|(name, _)| **name == endpoint)
            .and_then(|(_, queue)| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
            .unwrap_or(Reply::Status(404, None));

        match reply {
            Reply::Rotate => {
                script.rotations += 1;
                let n = script.rotations;
                Reply::tokens(&format!("access-{}", n), &format!("refresh-{}", n))
            }
            other => other,
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let reply = self.next_reply(&request);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match reply {
            Reply::Status(status, body) => Ok(TransportResponse::new(status, body)),
            Reply::ConnectionRefused => Err(TransportError::Connection {
                message: "connection refused".to_string(),
            }),
            Reply::Hang => std::future::pending().await,
            Reply::Rotate => unreachable!("rotations are expanded in next_reply"),
        }
    }
}

/// Store whose writes to one key always fail.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub failing_key: &'static str,
}

#[async_trait]
impl SecureStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == self.failing_key {
            return Err(StoreError::Backend {
                message: "disk full".to_string(),
            });
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}

/// Store that cannot be read, like a locked keychain.
#[derive(Clone, Default)]
pub struct LockedStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl SecureStore for LockedStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Backend {
            message: "keychain locked".to_string(),
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}

/// Store that logs every write as `set <key>` or `remove <key>`.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub ops: Arc<Mutex<Vec<String>>>,
}

impl RecordingStore {
    pub fn take_ops(&self) -> Vec<String> {
        std::mem::take(&mut *self.ops.lock().unwrap())
    }
}

#[async_trait]
impl SecureStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.ops.lock().unwrap().push(format!("set {}", key));
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.ops.lock().unwrap().push(format!("remove {}", key));
        self.inner.remove(key).await
    }
}

pub fn manager(transport: &ScriptedTransport, store: &MemoryStore) -> SessionManager {
    SessionManager::new(
        transport.clone(),
        ApiUrl::new(API).unwrap(),
        store.clone(),
    )
}

/// Stored (access, refresh) values.
pub async fn stored_pair(store: &MemoryStore) -> (Option<String>, Option<String>) {
    (
        store.get("auth.access_token").await.unwrap(),
        store.get("auth.refresh_token").await.unwrap(),
    )
}

/// `Authenticated` iff an access token is held.
pub async fn assert_invariant(session: &SessionManager) {
    let state = session.state().await;
    let token = session.access_token().await;
    assert_eq!(
        state.is_authenticated(),
        token.is_some(),
        "state {} disagrees with token presence",
        state
    );
}
