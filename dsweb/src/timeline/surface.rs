//! The UI surface the chat components draw on.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::Direction;

/// One rendered line of the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Outgoing entries are self-authored, incoming ones system-authored.
    pub direction: Direction,
    /// Message text as typed or delivered.
    pub text: String,
    /// Message text, already escaped.
    pub body: String,
    /// Formatted timestamp (`DD.MM.YYYY  HH:MM:SS`).
    pub date: String,
}

impl TimelineEntry {
    /// Markup fragment for this entry.
    ///
    /// The date keeps its double space as two non-breaking spaces.
    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"message\"><div class=\"{}\"><p>{}</p><date>{}</date></div></div>",
            self.direction.css_class(),
            self.body,
            self.date.replacen("  ", "&nbsp;&nbsp;", 1),
        )
    }
}

/// Display operations used by the renderer, the submission handler and the bootstrap.
///
/// A surface owns its timeline: entries are only ever appended.
pub trait UiSurface: Send {
    /// Append an entry to the end of the timeline.
    fn append_message(&mut self, entry: TimelineEntry);

    /// Scroll the timeline container so the last entry is visible.
    fn scroll_to_latest(&mut self);

    /// Current value of the text input.
    fn read_input(&self) -> String;

    /// Replace the value of the text input.
    fn set_input(&mut self, value: &str);

    fn clear_input(&mut self);

    fn focus_input(&mut self);

    /// Show literal text in the status panel.
    fn set_status(&mut self, status: &str);

    /// Replace the title line.
    fn set_title(&mut self, title: &str);

    /// Current title line.
    fn title(&self) -> String;

    /// Show a blocking warning to the operator.
    fn alert(&mut self, message: &str);

    /// Toggle the transient "pending" indicator.
    fn set_pending(&mut self, pending: bool);

    /// Hide the name selection and reveal the messaging area.
    fn show_messaging(&mut self);
}

/// A surface shared between the submission path and the inbound listener.
pub type SharedSurface = Arc<Mutex<dyn UiSurface>>;

/// Wrap a concrete surface for sharing.
pub fn share<S: UiSurface + 'static>(surface: S) -> (Arc<Mutex<S>>, SharedSurface) {
    let concrete = Arc::new(Mutex::new(surface));
    let shared: SharedSurface = concrete.clone();
    (concrete, shared)
}

/// The messages container as a markup fragment.
pub fn messages_html(entries: &[TimelineEntry]) -> String {
    let mut html = String::from("<div class=\"messages\">\n");
    for entry in entries {
        html.push_str(&entry.to_html());
        html.push('\n');
    }
    html.push_str("</div>\n");
    html
}

/// In-memory surface; keeps everything it is told and renders nowhere.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySurface {
    pub entries: Vec<TimelineEntry>,
    pub input: String,
    pub input_focused: bool,
    pub scroll_count: usize,
    pub status: Vec<String>,
    pub title: String,
    pub alerts: Vec<String>,
    pub pending: bool,
    pub pending_history: Vec<bool>,
    pub messaging_visible: bool,
}

#[cfg(test)]
impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl UiSurface for MemorySurface {
    fn append_message(&mut self, entry: TimelineEntry) {
        self.entries.push(entry);
    }

    fn scroll_to_latest(&mut self) {
        self.scroll_count += 1;
    }

    fn read_input(&self) -> String {
        self.input.clone()
    }

    fn set_input(&mut self, value: &str) {
        value.clone_into(&mut self.input);
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn focus_input(&mut self) {
        self.input_focused = true;
    }

    fn set_status(&mut self, status: &str) {
        self.status.push(status.to_string());
    }

    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
        self.pending_history.push(pending);
    }

    fn show_messaging(&mut self) {
        self.messaging_visible = true;
    }
}
