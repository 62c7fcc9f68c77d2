//! `SQLite` schema definitions for stickynotes.

/// SQL statement to create the notes table.
pub const CREATE_NOTES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    pinned BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)
";

/// Index matching the list ordering (pinned first, newest first).
pub const CREATE_LIST_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_notes_pinned_created ON notes(pinned DESC, created_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Columns selected for every note query, in `Note` field order.
pub const NOTE_COLUMNS: &str = "id, title, content, pinned, created_at";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_NOTES_TABLE,
    CREATE_LIST_INDEX,
    CREATE_METADATA_TABLE,
];
