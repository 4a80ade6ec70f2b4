//! Terminal rendition of the chat surface.

use std::io::Write;

use super::surface::{messages_html, TimelineEntry, UiSurface};
use crate::models::Direction;

/// Prints the timeline to stdout as it grows.
///
/// Entries are also retained so a transcript can be written at the end of
/// the session.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    entries: Vec<TimelineEntry>,
    input: String,
    title: String,
    messaging_visible: bool,
}

impl TerminalSurface {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// The messages container as a markup fragment.
    pub fn to_html(&self) -> String {
        messages_html(&self.entries)
    }

    /// Plain-text rendition of an entry. Markup is not interpreted on a
    /// terminal, so the raw text is shown.
    fn display(entry: &TimelineEntry) -> String {
        let (who, indent) = match entry.direction {
            Direction::Outgoing => ("me", "    "),
            Direction::Incoming => ("them", ""),
        };
        format!("{indent}[{who}] {}\n{indent}{}", entry.date, entry.text)
    }
}

impl UiSurface for TerminalSurface {
    fn append_message(&mut self, entry: TimelineEntry) {
        println!("{}", Self::display(&entry));
        self.entries.push(entry);
    }

    fn scroll_to_latest(&mut self) {
        // Output already ends at the latest entry; just make sure it is on screen.
        let _ = std::io::stdout().flush();
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
        // No prompt until the messaging area is shown.
        if !self.messaging_visible {
            return;
        }
        print!("> ");
        let _ = std::io::stdout().flush();
    }

    fn set_status(&mut self, status: &str) {
        println!("-- {status}");
    }

    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
        println!("== {title} ==");
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn alert(&mut self, message: &str) {
        eprintln!("!! {message}");
    }

    fn set_pending(&mut self, pending: bool) {
        if pending {
            tracing::debug!("pending...");
        }
    }

    fn show_messaging(&mut self) {
        self.messaging_visible = true;
        println!("Connected. Type a message and press Enter (/quit to leave).");
    }
}
