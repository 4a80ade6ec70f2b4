//! Display formatting for timeline entries.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

/// `DD.MM.YYYY  HH:MM:SS`, double space between date and time.
const TIMESTAMP_FORMAT: &str = "%d.%m.%Y  %H:%M:%S";

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Format an instant for display next to a message.
pub fn format_timestamp<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Escape text so it is shown literally inside markup.
///
/// Input is always treated as plain text: an existing entity such as
/// `&amp;` is escaped again.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
pub struct FixedClock(pub DateTime<Local>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_zero_padding() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 2).unwrap();
        assert_eq!(format_timestamp(&t), "05.03.2024  09:07:02");
    }

    #[test]
    fn test_two_digit_fields_and_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let t = tz.with_ymd_and_hms(1999, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(format_timestamp(&t), "31.12.1999  23:59:58");
    }

    #[test]
    fn test_fixed_width() {
        let t = Local.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&t).len(), "DD.MM.YYYY  HH:MM:SS".len());
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape_html("<b>hi</b>"), "&lt;b&gt;hi&lt;/b&gt;");
        assert_eq!(escape_html("a \"q\" & 'b'"), "a &quot;q&quot; &amp; &#39;b&#39;");
    }

    #[test]
    fn test_escape_treats_entities_as_text() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
        assert_eq!(escape_html(""), "");
        assert_eq!(escape_html("plain"), "plain");
    }
}
