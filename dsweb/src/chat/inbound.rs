//! Listener for message updates delivered to the participant.

use tokio::task::JoinHandle;

use crate::error::PubSubError;
use crate::models::{MessageUpdate, Session};
use crate::pubsub::Subscription;
use crate::timeline::MessageRenderer;

/// Subscribe to the session's `message-update` channel and render every
/// system-authored update as an incoming message.
///
/// Items are handled one at a time in arrival order on a background task;
/// the returned handle finishes when the channel closes.
pub async fn attach_listener(
    session: &Session,
    renderer: MessageRenderer,
) -> Result<JoinHandle<()>, PubSubError> {
    let channel = session.message_channel();
    let subscription = session.client.subscribe(&channel).await?;
    tracing::debug!(%channel, "listening for message updates");
    Ok(tokio::spawn(listen(subscription, renderer)))
}

async fn listen(mut subscription: Subscription, renderer: MessageRenderer) {
    while let Some(item) = subscription.recv().await {
        let Some(update) = MessageUpdate::parse(&item) else {
            tracing::warn!(%item, "ignoring malformed message update");
            continue;
        };

        tracing::debug!(id = ?update.id, status = %update.status, "message update");
        match update.renderable_text() {
            Some(text) => {
                renderer.render_incoming(text).await;
            }
            None => tracing::debug!(status = %update.status, "not rendered"),
        }
    }
    tracing::debug!("message update channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credentials, Direction, LoginRequest};
    use crate::pubsub::{LocalBroker, PubSubClient};
    use crate::timeline::{share, MemorySurface};
    use serde_json::json;
    use std::sync::Arc;

    async fn logged_in_session(broker: &LocalBroker) -> Session {
        let client = broker.connect();
        let credentials = Credentials {
            user: "ds:7".to_string(),
            secret: "s".to_string(),
        };
        client
            .login(&LoginRequest {
                user: credentials.user.clone(),
                secret: credentials.secret.clone(),
                role: "participant".to_string(),
                intervention_password: "123".to_string(),
            })
            .await
            .unwrap();
        Session::new(
            "alice".to_string(),
            "DS01".to_string(),
            credentials,
            Arc::new(client),
        )
    }

    #[tokio::test]
    async fn test_renders_only_system_messages() {
        let broker = LocalBroker::open();
        let session = logged_in_session(&broker).await;
        let (memory, shared) = share(MemorySurface::new());
        let handle = attach_listener(&session, MessageRenderer::new(shared))
            .await
            .unwrap();

        let channel = session.message_channel();
        assert_eq!(channel, "message-update/ds:7");
        broker
            .emit(&channel, json!({"id": 1, "status": "SENT_BY_SYSTEM", "message": "hello"}))
            .await;
        broker
            .emit(&channel, json!({"id": 2, "status": "SENT_BY_USER", "message": "echo"}))
            .await;
        broker.emit(&channel, json!("garbage")).await;
        broker
            .emit(&channel, json!({"id": 3, "status": "SENT_BY_SYSTEM", "message": "<i>bye</i>"}))
            .await;

        // The channel closes once every handle on the broker is gone.
        drop(session);
        drop(broker);
        handle.await.unwrap();

        let surface = memory.lock().await;
        let rendered: Vec<_> = surface
            .entries
            .iter()
            .map(|e| (e.direction, e.body.as_str()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                (Direction::Incoming, "hello"),
                (Direction::Incoming, "&lt;i&gt;bye&lt;/i&gt;"),
            ]
        );
    }
}
