//! Appends formatted messages to the timeline.

use std::sync::Arc;

use super::format::{escape_html, format_timestamp, Clock, SystemClock};
use super::surface::{SharedSurface, TimelineEntry};
use crate::models::Message;

/// Renders outgoing and incoming messages onto a shared surface.
///
/// Each call appends exactly one entry and then scrolls to it, under a
/// single lock so concurrent callers never interleave an append with
/// another caller's scroll.
#[derive(Clone)]
pub struct MessageRenderer {
    surface: SharedSurface,
    clock: Arc<dyn Clock>,
}

impl MessageRenderer {
    pub fn new(surface: SharedSurface) -> Self {
        Self::with_clock(surface, Arc::new(SystemClock))
    }

    pub fn with_clock(surface: SharedSurface, clock: Arc<dyn Clock>) -> Self {
        Self { surface, clock }
    }

    /// The surface this renderer draws on.
    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    /// Render a self-authored message stamped with the current instant.
    ///
    /// The returned message carries the same instant that was displayed.
    pub async fn render_outgoing(&self, text: &str) -> Message {
        let message = Message::outgoing(text, self.clock.now());
        self.render(&message).await;
        message
    }

    /// Render a system-authored message stamped with the current instant.
    pub async fn render_incoming(&self, text: &str) -> Message {
        let message = Message::incoming(text, self.clock.now());
        self.render(&message).await;
        message
    }

    async fn render(&self, message: &Message) {
        let entry = TimelineEntry {
            direction: message.direction,
            text: message.text.clone(),
            body: escape_html(&message.text),
            date: format_timestamp(&message.timestamp),
        };

        let mut surface = self.surface.lock().await;
        surface.append_message(entry);
        surface.scroll_to_latest();
        tracing::trace!(direction = %message.direction, "rendered message");
    }
}
