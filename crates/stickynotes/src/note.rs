//! The note entity.
//!
//! A note's `content` is rich-text markup produced by the editor. It is
//! stored and passed around verbatim. The plain-text helpers here exist for
//! surfaces that cannot render markup, such as the CLI.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Title shown for a note whose title is empty.
pub const UNTITLED: &str = "Untitled";

/// Timestamp layout used by the `created_at` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A persisted sticky note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Identifier assigned by the store.
    pub id: i64,
    /// Note title.
    pub title: String,
    /// Rich-text markup.
    pub content: String,
    /// Whether the note is shown in the pinned window.
    pub pinned: bool,
    /// When the note was first saved.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a note.
///
/// Missing fields deserialize to empty values, mirroring what the editor
/// sends for a note that was never typed into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewNote {
    /// Note title.
    pub title: String,
    /// Rich-text markup.
    pub content: String,
    /// Initial pinned state.
    pub pinned: bool,
}

/// A partial update from the pinned window editor.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteFields {
    /// Replacement title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NewNote {
    /// Create an unpinned note payload.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            pinned: false,
        }
    }
}

impl NoteFields {
    /// Fields replacing both title and content.
    #[must_use]
    pub fn both(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }

    /// Returns true when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

impl Note {
    /// The title, or [`UNTITLED`] when empty.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Content with markup removed and common entities decoded.
    #[must_use]
    pub fn plain_text(&self) -> String {
        strip_markup(&self.content)
    }

    /// A plain-text preview of at most `max_chars` characters.
    ///
    /// An ellipsis is appended when the text was cut.
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> String {
        let text = self.plain_text();
        if text.chars().count() <= max_chars {
            return text;
        }
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.truncate(cut.trim_end().len());
        cut.push('…');
        cut
    }

    /// Whether the stored markup is longer than `limit` characters.
    ///
    /// The list window fades out long, unpinned notes past this point.
    #[must_use]
    pub fn is_long(&self, limit: usize) -> bool {
        self.content.chars().count() > limit
    }

    /// The creation date formatted like "March 4, 2025".
    #[must_use]
    pub fn created_on(&self) -> String {
        self.created_at.format("%B %-d, %Y").to_string()
    }
}

/// Parse a `created_at` column value.
///
/// Accepts the SQLite `CURRENT_TIMESTAMP` layout and RFC 3339.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Format a timestamp for the `created_at` column.
#[must_use]
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static tag pattern is valid"))
}

fn block_break_pattern() -> &'static Regex {
    static BREAK: OnceLock<Regex> = OnceLock::new();
    BREAK.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</(p|li|h[1-6]|blockquote|pre)>")
            .expect("static break pattern is valid")
    })
}

fn whitespace_pattern() -> &'static Regex {
    static SPACE: OnceLock<Regex> = OnceLock::new();
    SPACE.get_or_init(|| Regex::new(r"\s+").expect("static whitespace pattern is valid"))
}

/// Remove tags from editor markup and collapse whitespace.
#[must_use]
pub fn strip_markup(markup: &str) -> String {
    let spaced = block_break_pattern().replace_all(markup, " ");
    let text = tag_pattern().replace_all(&spaced, "");
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    whitespace_pattern()
        .replace_all(decoded.trim(), " ")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn note(title: &str, content: &str) -> Note {
        Note {
            id: 1,
            title: title.to_string(),
            content: content.to_string(),
            pinned: false,
            created_at: Utc.with_ymd_and_hms(2025, 3, 4, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_display_title_falls_back_to_untitled() {
        assert_eq!(note("", "").display_title(), "Untitled");
        assert_eq!(note("   ", "").display_title(), "Untitled");
        assert_eq!(note("Groceries", "").display_title(), "Groceries");
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(
            strip_markup("<p>Buy <strong>milk</strong></p><p>and eggs</p>"),
            "Buy milk and eggs"
        );
        assert_eq!(strip_markup("<ul><li>one</li><li>two</li></ul>"), "one two");
        assert_eq!(strip_markup("a &amp; b &lt;3"), "a & b <3");
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn test_excerpt_cuts_with_ellipsis() {
        let n = note("t", "<p>hello wonderful world</p>");
        assert_eq!(n.excerpt(100), "hello wonderful world");
        assert_eq!(n.excerpt(6), "hello…");
    }

    #[test]
    fn test_excerpt_counts_chars_not_bytes() {
        let n = note("t", "<p>héllo wörld</p>");
        assert_eq!(n.excerpt(5), "héllo…");
    }

    #[test]
    fn test_is_long() {
        let n = note("t", &"x".repeat(151));
        assert!(n.is_long(150));
        assert!(!note("t", "short").is_long(150));
    }

    #[test]
    fn test_is_long_counts_chars_not_bytes() {
        let n = note("t", &"é".repeat(100));
        assert!(!n.is_long(150));
        assert!(note("t", &"é".repeat(151)).is_long(150));
    }

    #[test]
    fn test_created_on() {
        assert_eq!(note("t", "").created_on(), "March 4, 2025");
    }

    #[test]
    fn test_parse_timestamp_sqlite_layout() {
        let parsed = parse_timestamp("2025-03-04 10:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 4, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let parsed = parse_timestamp("2025-03-04T10:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 4, 8, 30, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(&ts), "2025-01-02 03:04:05");
    }

    #[test]
    fn test_new_note_defaults_missing_fields() {
        let parsed: NewNote = serde_json::from_str(r#"{"title": "only title"}"#).unwrap();
        assert_eq!(parsed.title, "only title");
        assert_eq!(parsed.content, "");
        assert!(!parsed.pinned);
    }

    #[test]
    fn test_note_fields_is_empty() {
        assert!(NoteFields::default().is_empty());
        assert!(!NoteFields::both("t", "c").is_empty());

        let parsed: NoteFields = serde_json::from_str(r#"{"content": "<p>x</p>"}"#).unwrap();
        assert!(parsed.title.is_none());
        assert_eq!(parsed.content.as_deref(), Some("<p>x</p>"));
    }
}
