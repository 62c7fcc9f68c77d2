//! Storage layer for stickynotes.
//!
//! A single `SQLite` table holds every note. The store is owned by one
//! writer (the service loop) and accessed sequentially.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::note::{format_timestamp, parse_timestamp, NewNote, Note, NoteFields};

use schema::NOTE_COLUMNS;

/// Storage engine for notes.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All notes, pinned first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes ORDER BY pinned DESC, created_at DESC, id DESC"
        ))?;

        let notes = stmt
            .query_map([], Self::row_to_note)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    /// Get a note by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_note(&self, id: i64) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1"),
                [id],
                Self::row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    /// Like [`Storage::get_note`] but a missing note is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if no note has this id.
    pub fn require_note(&self, id: i64) -> Result<Note> {
        self.get_note(id)?.ok_or(Error::NoteNotFound { id })
    }

    /// Insert a new note stamped with the current time.
    ///
    /// Returns the stored note with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_note(&self, note: &NewNote) -> Result<Note> {
        let created_at = format_timestamp(&Utc::now());

        self.conn.execute(
            "INSERT INTO notes (title, content, pinned, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![note.title, note.content, note.pinned, created_at],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted note with id {}", id);

        self.get_note(id)?
            .ok_or_else(|| Error::internal(format!("note {id} missing right after insert")))
    }

    /// Replace the content of a note, leaving every other column alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if no note has this id.
    pub fn update_content(&self, id: i64, content: &str) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE notes SET content = ?1 WHERE id = ?2",
            params![content, id],
        )?;
        Self::expect_row(affected, id)
    }

    /// Apply a pinned-window edit and keep the note pinned.
    ///
    /// Fields left as `None` keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if no note has this id.
    pub fn update_pinned(&self, id: i64, fields: &NoteFields) -> Result<Note> {
        let affected = self.conn.execute(
            r"
            UPDATE notes
            SET title = COALESCE(?1, title), content = COALESCE(?2, content), pinned = TRUE
            WHERE id = ?3
            ",
            params![fields.title, fields.content, id],
        )?;
        Self::expect_row(affected, id)?;
        self.require_note(id)
    }

    /// Delete a note.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if no note has this id.
    pub fn delete_note(&self, id: i64) -> Result<()> {
        let affected = self.conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
        Self::expect_row(affected, id)?;
        debug!("Deleted note {}", id);
        Ok(())
    }

    /// Flip the pinned flag of a note and return the new state.
    ///
    /// Pinning is exclusive: every other note is unpinned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if no note has this id.
    pub fn toggle_pin(&self, id: i64) -> Result<bool> {
        let current: Option<bool> = self
            .conn
            .query_row("SELECT pinned FROM notes WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;

        match current {
            None => Err(Error::NoteNotFound { id }),
            Some(true) => {
                self.set_pinned(id, false)?;
                Ok(false)
            }
            Some(false) => {
                self.pin_exclusive(id)?;
                Ok(true)
            }
        }
    }

    /// Set the pinned flag of one note without touching the others.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if no note has this id.
    pub fn set_pinned(&self, id: i64, pinned: bool) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE notes SET pinned = ?1 WHERE id = ?2",
            params![pinned, id],
        )?;
        Self::expect_row(affected, id)
    }

    /// Pin one note and unpin all others in a single statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if no note has this id.
    pub fn pin_exclusive(&self, id: i64) -> Result<()> {
        if self.get_note(id)?.is_none() {
            return Err(Error::NoteNotFound { id });
        }
        self.conn.execute(
            "UPDATE notes SET pinned = (id = ?1) WHERE pinned OR id = ?1",
            [id],
        )?;
        Ok(())
    }

    /// Unpin every note. Returns how many were pinned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_pins(&self) -> Result<usize> {
        let affected = self
            .conn
            .execute("UPDATE notes SET pinned = FALSE WHERE pinned", [])?;
        if affected > 0 {
            info!("Cleared {} stale pin(s)", affected);
        }
        Ok(affected)
    }

    /// Count notes in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<NoteStats> {
        let (total_notes, pinned_notes, oldest, newest): (
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = self.conn.query_row(
            r"
            SELECT COUNT(*), COALESCE(SUM(pinned), 0), MIN(created_at), MAX(created_at)
            FROM notes
            ",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(NoteStats {
            total_notes,
            pinned_notes,
            oldest_note: oldest.as_deref().and_then(parse_timestamp),
            newest_note: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }

    fn expect_row(affected: usize, id: i64) -> Result<()> {
        if affected == 0 {
            Err(Error::NoteNotFound { id })
        } else {
            Ok(())
        }
    }

    /// Convert a database row to a Note.
    fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<Note> {
        let id: i64 = row.get(0)?;
        let title: Option<String> = row.get(1)?;
        let content: Option<String> = row.get(2)?;
        let pinned: Option<bool> = row.get(3)?;
        let created_at_str: String = row.get(4)?;

        let created_at = parse_timestamp(&created_at_str).unwrap_or_else(|| {
            warn!(
                "Unparseable created_at '{}' on note {}, using now",
                created_at_str, id
            );
            Utc::now()
        });

        Ok(Note {
            id,
            title: title.unwrap_or_default(),
            content: content.unwrap_or_default(),
            pinned: pinned.unwrap_or(false),
            created_at,
        })
    }
}

/// Statistics about the note store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteStats {
    /// Total number of notes.
    pub total_notes: i64,
    /// Number of pinned notes.
    pub pinned_notes: i64,
    /// Creation time of the oldest note.
    pub oldest_note: Option<DateTime<Utc>>,
    /// Creation time of the newest note.
    pub newest_note: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn insert(storage: &Storage, title: &str) -> Note {
        storage
            .insert_note(&NewNote::new(title, format!("<p>{title}</p>")))
            .unwrap()
    }

    fn pinned_ids(storage: &Storage) -> Vec<i64> {
        storage
            .list_notes()
            .unwrap()
            .into_iter()
            .filter(|n| n.pinned)
            .map(|n| n.id)
            .collect()
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_insert_assigns_id_and_persists() {
        let storage = create_test_storage();
        let note = storage
            .insert_note(&NewNote::new("Groceries", "<p>milk</p>"))
            .unwrap();

        assert!(note.id > 0);
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "<p>milk</p>");
        assert!(!note.pinned);

        let fetched = storage.get_note(note.id).unwrap().unwrap();
        assert_eq!(fetched, note);
    }

    #[test]
    fn test_insert_assigns_distinct_ids() {
        let storage = create_test_storage();
        let a = insert(&storage, "a");
        let b = insert(&storage, "b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get_note(99_999).unwrap().is_none());
        assert!(storage.require_note(99_999).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_orders_pinned_then_newest() {
        let storage = create_test_storage();
        let first = insert(&storage, "first");
        let second = insert(&storage, "second");
        let third = insert(&storage, "third");

        storage.pin_exclusive(first.id).unwrap();

        let ids: Vec<i64> = storage.list_notes().unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![first.id, third.id, second.id]);
    }

    #[test]
    fn test_update_content_changes_only_content() {
        let storage = create_test_storage();
        let note = insert(&storage, "title");
        storage.pin_exclusive(note.id).unwrap();

        storage.update_content(note.id, "<p>new</p>").unwrap();

        let updated = storage.get_note(note.id).unwrap().unwrap();
        assert_eq!(updated.content, "<p>new</p>");
        assert_eq!(updated.title, "title");
        assert!(updated.pinned);
        assert_eq!(updated.created_at, note.created_at);
    }

    #[test]
    fn test_update_content_missing_note() {
        let storage = create_test_storage();
        let err = storage.update_content(7, "x").unwrap_err();
        assert!(matches!(err, Error::NoteNotFound { id: 7 }));
    }

    #[test]
    fn test_delete() {
        let storage = create_test_storage();
        let note = insert(&storage, "to delete");

        storage.delete_note(note.id).unwrap();
        assert!(storage.get_note(note.id).unwrap().is_none());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.delete_note(99_999).unwrap_err().is_not_found());
    }

    #[test]
    fn test_toggle_pin_flips_state() {
        let storage = create_test_storage();
        let note = insert(&storage, "n");

        assert!(storage.toggle_pin(note.id).unwrap());
        assert!(storage.get_note(note.id).unwrap().unwrap().pinned);

        assert!(!storage.toggle_pin(note.id).unwrap());
        assert!(!storage.get_note(note.id).unwrap().unwrap().pinned);
    }

    #[test]
    fn test_toggle_pin_is_exclusive() {
        let storage = create_test_storage();
        let a = insert(&storage, "a");
        let b = insert(&storage, "b");

        storage.toggle_pin(a.id).unwrap();
        storage.toggle_pin(b.id).unwrap();

        assert_eq!(pinned_ids(&storage), vec![b.id]);
    }

    #[test]
    fn test_toggle_pin_missing_note() {
        let storage = create_test_storage();
        assert!(storage.toggle_pin(3).unwrap_err().is_not_found());
    }

    #[test]
    fn test_pin_exclusive_transfers_pin() {
        let storage = create_test_storage();
        let a = insert(&storage, "a");
        let b = insert(&storage, "b");
        let c = insert(&storage, "c");

        storage.set_pinned(a.id, true).unwrap();
        storage.set_pinned(c.id, true).unwrap();
        storage.pin_exclusive(b.id).unwrap();

        assert_eq!(pinned_ids(&storage), vec![b.id]);
    }

    #[test]
    fn test_pin_exclusive_missing_note_keeps_existing_pin() {
        let storage = create_test_storage();
        let a = insert(&storage, "a");
        storage.pin_exclusive(a.id).unwrap();

        assert!(storage.pin_exclusive(404).unwrap_err().is_not_found());
        assert_eq!(pinned_ids(&storage), vec![a.id]);
    }

    #[test]
    fn test_update_pinned_coalesces_fields() {
        let storage = create_test_storage();
        let note = insert(&storage, "title");

        let updated = storage
            .update_pinned(
                note.id,
                &NoteFields {
                    title: None,
                    content: Some("<p>typed</p>".to_string()),
                },
            )
            .unwrap();

        assert_eq!(updated.title, "title");
        assert_eq!(updated.content, "<p>typed</p>");
        assert!(updated.pinned);

        let updated = storage
            .update_pinned(
                note.id,
                &NoteFields {
                    title: Some("renamed".to_string()),
                    content: None,
                },
            )
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.content, "<p>typed</p>");
    }

    #[test]
    fn test_update_pinned_missing_note() {
        let storage = create_test_storage();
        let err = storage
            .update_pinned(12, &NoteFields::both("t", "c"))
            .unwrap_err();
        assert!(matches!(err, Error::NoteNotFound { id: 12 }));
    }

    #[test]
    fn test_clear_pins() {
        let storage = create_test_storage();
        let a = insert(&storage, "a");
        insert(&storage, "b");
        storage.set_pinned(a.id, true).unwrap();

        assert_eq!(storage.clear_pins().unwrap(), 1);
        assert!(pinned_ids(&storage).is_empty());
        assert_eq!(storage.clear_pins().unwrap(), 0);
    }

    #[test]
    fn test_empty_and_unicode_content() {
        let storage = create_test_storage();
        let empty = storage.insert_note(&NewNote::default()).unwrap();
        assert_eq!(empty.title, "");
        assert_eq!(empty.content, "");

        let unicode = storage
            .insert_note(&NewNote::new("日本語", "<p>héllo 🌍</p>"))
            .unwrap();
        let fetched = storage.get_note(unicode.id).unwrap().unwrap();
        assert_eq!(fetched.title, "日本語");
        assert_eq!(fetched.content, "<p>héllo 🌍</p>");
    }

    #[test]
    fn test_default_timestamp_rows_parse() {
        let storage = create_test_storage();
        storage
            .conn
            .execute(
                "INSERT INTO notes (title, content) VALUES ('raw', '<p>x</p>')",
                [],
            )
            .unwrap();

        let notes = storage.list_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert!(!notes[0].pinned);
        assert!((Utc::now() - notes[0].created_at).num_minutes() < 5);
    }

    #[test]
    fn test_stats_empty() {
        let stats = create_test_storage().stats().unwrap();

        assert_eq!(stats.total_notes, 0);
        assert_eq!(stats.pinned_notes, 0);
        assert!(stats.oldest_note.is_none());
        assert!(stats.newest_note.is_none());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        let a = insert(&storage, "a");
        insert(&storage, "b");
        storage.pin_exclusive(a.id).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_notes, 2);
        assert_eq!(stats.pinned_notes, 1);
        assert!(stats.oldest_note.is_some());
        assert!(stats.newest_note.is_some());
    }

    #[test]
    fn test_path() {
        assert_eq!(create_test_storage().path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based_creates_parent_dirs() {
        let root = std::env::temp_dir().join(format!("stickynotes_test_{}", std::process::id()));
        let db_path = root.join("nested").join("notes.sqlite");
        let _ = std::fs::remove_dir_all(&root);

        let storage = Storage::open(&db_path).unwrap();
        let note = insert(&storage, "persisted");
        assert!(db_path.exists());
        assert_eq!(storage.path(), db_path);
        drop(storage);

        // Reopen and read back
        let storage = Storage::open(&db_path).unwrap();
        assert_eq!(storage.get_note(note.id).unwrap().unwrap().title, "persisted");
        assert!(storage.stats().unwrap().db_size_bytes > 0);

        drop(storage);
        let _ = std::fs::remove_dir_all(&root);
    }
}
