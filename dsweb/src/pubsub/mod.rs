//! Publish/subscribe session seam.
//!
//! The chat components only see [`PubSubClient`]; the transport behind it is
//! someone else's business. [`LocalBroker`] is the in-process implementation
//! used for offline simulation and tests.

mod broker;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::PubSubError;
use crate::models::LoginRequest;

pub use broker::LocalBroker;

/// RPC the participant uses to hand a typed message to the backend.
pub const RPC_USER_MESSAGE: &str = "user-message";

/// Items delivered on a subscribed event channel, in arrival order.
pub type Subscription = mpsc::UnboundedReceiver<Value>;

/// A pub/sub connection: login, event subscription and RPC.
#[async_trait]
pub trait PubSubClient: Send + Sync {
    /// Authenticate the connection. Returns the server's client data on success.
    async fn login(&self, auth: &LoginRequest) -> Result<Value, PubSubError>;

    /// Subscribe to an event channel.
    async fn subscribe(&self, channel: &str) -> Result<Subscription, PubSubError>;

    /// Call a remote procedure and wait for its result.
    async fn make_rpc(&self, name: &str, payload: Value) -> Result<Value, PubSubError>;
}
