//! In-process pub/sub broker.
//!
//! Holds event channels, RPC providers and the accounts it will accept on
//! login. Clients obtained from [`LocalBroker::connect`] implement
//! [`PubSubClient`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;

use super::{PubSubClient, Subscription, RPC_USER_MESSAGE};
use crate::chat::Registrar;
use crate::error::{PubSubError, RestError};
use crate::models::{Credentials, LoginRequest, MessageUpdate, RegistrationRequest};

const SECRET_LENGTH: usize = 24;

/// Handler answering an RPC.
pub type RpcProvider = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

#[derive(Default)]
struct BrokerState {
    /// channel -> live subscribers
    channels: RwLock<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>,
    /// rpc name -> provider
    providers: RwLock<HashMap<String, RpcProvider>>,
    /// user -> secret
    accounts: RwLock<HashMap<String, String>>,
    /// Accept any credentials on login.
    open: bool,
}

/// Shared in-process broker. Cheap to clone.
#[derive(Clone)]
pub struct LocalBroker {
    state: Arc<BrokerState>,
}

impl LocalBroker {
    /// A broker that only accepts accounts it issued or was told about.
    pub fn new() -> Self {
        Self {
            state: Arc::new(BrokerState::default()),
        }
    }

    /// A broker that accepts any credentials on login.
    ///
    /// Used when registration happens against a remote backend this broker
    /// knows nothing about.
    pub fn open() -> Self {
        Self {
            state: Arc::new(BrokerState {
                open: true,
                ..BrokerState::default()
            }),
        }
    }

    /// Open a new client connection.
    pub fn connect(&self) -> LocalClient {
        LocalClient {
            broker: self.clone(),
            user: Mutex::new(None),
        }
    }

    /// Accept `credentials` on future logins.
    pub async fn authorize(&self, credentials: &Credentials) {
        self.state
            .accounts
            .write()
            .await
            .insert(credentials.user.clone(), credentials.secret.clone());
    }

    /// Register the provider for an RPC, replacing any previous one.
    pub async fn provide(&self, name: &str, provider: RpcProvider) {
        self.state
            .providers
            .write()
            .await
            .insert(name.to_string(), provider);
    }

    /// Deliver `payload` to every live subscriber of `channel`.
    ///
    /// Returns the number of subscribers reached.
    pub async fn emit(&self, channel: &str, payload: Value) -> usize {
        emit_on(&self.state, channel, &payload).await
    }

    /// Answer `user-message` RPCs by emitting the text back as a system message
    /// on the sender's `message-update` channel.
    pub async fn provide_echo(&self) {
        let state: Weak<BrokerState> = Arc::downgrade(&self.state);
        let provider: RpcProvider = Arc::new(move |payload: Value| {
            let user = payload
                .get("user")
                .and_then(Value::as_str)
                .ok_or("missing user")?
                .to_string();
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .ok_or("missing message")?
                .to_string();
            let state = state.upgrade().ok_or("broker gone")?;

            let update = serde_json::to_value(MessageUpdate::from_system(message))
                .map_err(|e| e.to_string())?;
            tokio::spawn(async move {
                emit_on(&state, &format!("message-update/{user}"), &update).await;
            });

            Ok(json!({ "status": "received" }))
        });
        self.provide(RPC_USER_MESSAGE, provider).await;
    }

    async fn check_login(&self, auth: &LoginRequest) -> Result<(), PubSubError> {
        if self.state.open {
            return Ok(());
        }
        let accounts = self.state.accounts.read().await;
        match accounts.get(&auth.user) {
            Some(secret) if *secret == auth.secret => Ok(()),
            Some(_) => Err(PubSubError::LoginRejected("wrong secret".to_string())),
            None => Err(PubSubError::LoginRejected(format!(
                "unknown user {}",
                auth.user
            ))),
        }
    }
}

impl Default for LocalBroker {
    fn default() -> Self {
        Self::new()
    }
}

async fn emit_on(state: &BrokerState, channel: &str, payload: &Value) -> usize {
    let mut channels = state.channels.write().await;
    let Some(subscribers) = channels.get_mut(channel) else {
        return 0;
    };
    subscribers.retain(|tx| tx.send(payload.clone()).is_ok());
    subscribers.len()
}

/// Registration answered by the broker itself: issues a fresh identity and
/// secret and accepts them on login.
#[async_trait]
impl Registrar for LocalBroker {
    async fn register(&self, request: &RegistrationRequest) -> Result<Credentials, RestError> {
        let secret: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SECRET_LENGTH)
            .map(char::from)
            .collect();
        let credentials = Credentials {
            user: format!("ds:{}", Uuid::now_v7()),
            secret,
        };
        self.authorize(&credentials).await;
        tracing::debug!(
            nickname = %request.nickname,
            pattern = %request.intervention_pattern,
            user = %credentials.user,
            "registered locally"
        );
        Ok(credentials)
    }
}

/// A connection to a [`LocalBroker`].
pub struct LocalClient {
    broker: LocalBroker,
    /// Logged-in user, if any.
    user: Mutex<Option<String>>,
}

impl LocalClient {
    async fn require_login(&self) -> Result<(), PubSubError> {
        if self.user.lock().await.is_some() {
            Ok(())
        } else {
            Err(PubSubError::NotLoggedIn)
        }
    }
}

#[async_trait]
impl PubSubClient for LocalClient {
    async fn login(&self, auth: &LoginRequest) -> Result<Value, PubSubError> {
        self.broker.check_login(auth).await?;
        *self.user.lock().await = Some(auth.user.clone());
        Ok(json!({ "user": auth.user, "role": auth.role }))
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, PubSubError> {
        self.require_login().await?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.broker
            .state
            .channels
            .write()
            .await
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }

    async fn make_rpc(&self, name: &str, payload: Value) -> Result<Value, PubSubError> {
        self.require_login().await?;
        let provider = self
            .broker
            .state
            .providers
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| PubSubError::NoRpcProvider(name.to_string()))?;

        provider(payload).map_err(|reason| PubSubError::Rpc {
            name: name.to_string(),
            reason,
        })
    }
}
