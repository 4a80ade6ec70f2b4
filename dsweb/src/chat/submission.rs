//! Submission of typed messages.
//!
//! A submission is triggered by the send control or by Enter in the input.
//! Each one runs `Idle -> Validating -> Rejected | Accepted -> Idle`:
//! blank input is rejected without side effects; anything else is echoed
//! locally, the input is cleared and refocused, and the text is handed to
//! the sender without waiting for it.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::models::{Message, Session};
use crate::pubsub::RPC_USER_MESSAGE;
use crate::timeline::{MessageRenderer, SharedSurface};

/// Phase of a single submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Rejected,
    Accepted,
}

/// A key pressed while the text input has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Other,
}

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Blank input; nothing rendered or sent.
    Rejected,
    /// Rendered and dispatched.
    Accepted(Message),
}

/// What happened to a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Enter: default behavior prevented, submission performed.
    Submitted(SubmissionOutcome),
    /// Any other key is left to the input.
    PassThrough,
}

/// Destination of accepted messages.
///
/// Implementations must not block: delivery happens in the background and
/// its failure never reaches the submitter.
pub trait MessageSender: Send + Sync {
    fn send(&self, message: &Message);
}

/// Sends messages through the session's `user-message` RPC.
pub struct SessionSender {
    session: Session,
}

impl SessionSender {
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl MessageSender for SessionSender {
    fn send(&self, message: &Message) {
        let client = self.session.client.clone();
        let user = self.session.user().to_string();
        let text = message.text.clone();
        let timestamp = message.timestamp_millis();

        tracing::debug!("Sending message \"{text}\" with timestamp {timestamp}...");
        tokio::spawn(async move {
            let payload = json!({
                "user": user,
                "message": text,
                "timestamp": timestamp,
            });
            match client.make_rpc(RPC_USER_MESSAGE, payload).await {
                Ok(result) => tracing::debug!(%result, "sending result"),
                Err(e) => tracing::warn!("sending failed: {e}"),
            }
        });
    }
}

/// Shows the pending indicator for a short while after each accepted submission.
#[derive(Clone)]
pub struct PendingIndicator {
    surface: SharedSurface,
    show_after: Duration,
    clear_after: Duration,
}

impl PendingIndicator {
    /// `show_after` and `clear_after` are both measured from acceptance.
    pub const fn new(surface: SharedSurface, show_after: Duration, clear_after: Duration) -> Self {
        Self {
            surface,
            show_after,
            clear_after,
        }
    }

    /// Schedule show and clear; returns immediately.
    pub fn trigger(&self) -> tokio::task::JoinHandle<()> {
        let surface = self.surface.clone();
        let show_after = self.show_after;
        let remaining = self.clear_after.saturating_sub(self.show_after);
        tokio::spawn(async move {
            tokio::time::sleep(show_after).await;
            surface.lock().await.set_pending(true);
            tokio::time::sleep(remaining).await;
            surface.lock().await.set_pending(false);
        })
    }
}

/// Handles the send control and Enter key of one chat input.
pub struct SubmissionHandler {
    renderer: MessageRenderer,
    sender: Arc<dyn MessageSender>,
    indicator: Option<PendingIndicator>,
}

impl SubmissionHandler {
    pub fn new(renderer: MessageRenderer, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            renderer,
            sender,
            indicator: None,
        }
    }

    #[must_use]
    pub fn with_indicator(mut self, indicator: PendingIndicator) -> Self {
        self.indicator = Some(indicator);
        self
    }

    /// A key pressed in the input. Enter is turned into a submission.
    pub async fn key_press(&self, key: Key) -> KeyOutcome {
        match key {
            Key::Enter => KeyOutcome::Submitted(self.submit().await),
            Key::Char(_) | Key::Other => KeyOutcome::PassThrough,
        }
    }

    /// Explicit activation of the send control.
    pub async fn submit(&self) -> SubmissionOutcome {
        let surface = self.renderer.surface().clone();
        let text = surface.lock().await.read_input();
        log_transition(SubmissionState::Idle, SubmissionState::Validating);

        if text.trim().is_empty() {
            log_transition(SubmissionState::Validating, SubmissionState::Rejected);
            log_transition(SubmissionState::Rejected, SubmissionState::Idle);
            return SubmissionOutcome::Rejected;
        }
        log_transition(SubmissionState::Validating, SubmissionState::Accepted);

        let message = self.renderer.render_outgoing(&text).await;

        {
            let mut surface = surface.lock().await;
            surface.clear_input();
            surface.focus_input();
        }

        self.sender.send(&message);
        if let Some(ref indicator) = self.indicator {
            indicator.trigger();
        }

        log_transition(SubmissionState::Accepted, SubmissionState::Idle);
        SubmissionOutcome::Accepted(message)
    }
}

fn log_transition(from: SubmissionState, to: SubmissionState) {
    tracing::trace!(?from, ?to, "submission");
}
