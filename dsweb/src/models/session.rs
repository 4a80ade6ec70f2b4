//! Session model: the registered participant and its pub/sub client.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pubsub::PubSubClient;

/// Identity/credential pair issued by the backend on registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub secret: String,
}

/// Body of the `deepstream/register` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub nickname: String,
    pub role: String,
    #[serde(rename = "intervention-pattern")]
    pub intervention_pattern: String,
    #[serde(rename = "intervention-password")]
    pub intervention_password: String,
}

/// Authentication data for the pub/sub login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user: String,
    pub secret: String,
    pub role: String,
    #[serde(rename = "intervention-password")]
    pub intervention_password: String,
}

/// An established chat session.
///
/// Owns the credentials and the logged-in client; handed explicitly to the
/// components that send or listen.
#[derive(Clone)]
pub struct Session {
    /// Name the participant registered with.
    pub display_name: String,
    /// Intervention the participant belongs to.
    pub routing_key: String,
    /// Credentials issued on registration.
    pub credentials: Credentials,
    /// Logged-in pub/sub client.
    pub client: Arc<dyn PubSubClient>,
}

impl Session {
    pub fn new(
        display_name: String,
        routing_key: String,
        credentials: Credentials,
        client: Arc<dyn PubSubClient>,
    ) -> Self {
        Self {
            display_name,
            routing_key,
            credentials,
            client,
        }
    }

    /// Identity assigned by the backend.
    pub fn user(&self) -> &str {
        &self.credentials.user
    }

    /// Channel on which message updates for this participant are delivered.
    pub fn message_channel(&self) -> String {
        format!("message-update/{}", self.credentials.user)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("display_name", &self.display_name)
            .field("routing_key", &self.routing_key)
            .field("user", &self.credentials.user)
            .finish_non_exhaustive()
    }
}
