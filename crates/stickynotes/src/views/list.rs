//! The main window's note list.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::events::AppEvent;
use crate::ipc::NoteApi;
use crate::note::{NewNote, Note};

/// Notes as the main window shows them.
#[derive(Debug)]
pub struct NoteList<A> {
    api: A,
    notes: Vec<Note>,
}

impl<A: NoteApi> NoteList<A> {
    /// An empty list backed by `api`. Call [`NoteList::load`] to fill it.
    pub fn new(api: A) -> Self {
        Self {
            api,
            notes: Vec::new(),
        }
    }

    /// The displayed notes, newest first.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Look up a displayed note.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// The note marked pinned, if any.
    #[must_use]
    pub fn pinned(&self) -> Option<&Note> {
        self.notes.iter().find(|n| n.pinned)
    }

    /// Fetch every note and sort newest first.
    ///
    /// # Errors
    ///
    /// Returns the service failure, if any.
    pub async fn load(&mut self) -> Result<()> {
        let mut notes = self.api.get_notes().await?;
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        debug!("Loaded {} note(s)", notes.len());
        self.notes = notes;
        Ok(())
    }

    /// Save a new note from the add form.
    ///
    /// A blank title is ignored and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns the service failure, if any.
    pub async fn add(&mut self, title: &str, content: &str) -> Result<Option<Note>> {
        let title = title.trim();
        if title.is_empty() {
            debug!("Ignoring note without a title");
            return Ok(None);
        }

        let note = self.api.save_note(NewNote::new(title, content)).await?;
        self.notes.insert(0, note.clone());
        Ok(Some(note))
    }

    /// Delete a note, removing it locally once the service agrees.
    ///
    /// # Errors
    ///
    /// Returns the service failure, if any. The note stays listed.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.api.delete_note(id).await?;
        self.notes.retain(|n| n.id != id);
        Ok(())
    }

    /// Save edited content and tell the other windows about it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if the note is not listed, or the
    /// service failure.
    pub async fn save_edit(&mut self, id: i64, content: &str) -> Result<()> {
        let mut edited = self.get(id).cloned().ok_or(Error::NoteNotFound { id })?;
        edited.content = content.to_string();

        self.api.update_note(id, edited.content.clone()).await?;
        self.api.broadcast_note_update(edited.clone()).await?;

        if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
            *note = edited;
        }
        Ok(())
    }

    /// Handle a click on a note's pin button.
    ///
    /// Clicking the pinned note closes the pinned window. Clicking any other
    /// note moves the pinned window to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if the note is not listed, or the
    /// service failure.
    pub async fn toggle_pin(&mut self, id: i64) -> Result<()> {
        let currently_pinned = self.get(id).ok_or(Error::NoteNotFound { id })?.pinned;

        self.api.close_pinned_window().await?;
        if currently_pinned {
            if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
                note.pinned = false;
            }
            info!("Unpinned note {}", id);
            return Ok(());
        }

        self.api.open_pinned_window(id).await?;
        for note in &mut self.notes {
            note.pinned = note.id == id;
        }
        info!("Pinned note {}", id);
        Ok(())
    }

    /// Merge a `note-updated` payload, keeping the local pinned flag.
    ///
    /// Returns whether a listed note changed.
    pub fn apply_update(&mut self, updated: &Note) -> bool {
        match self.notes.iter_mut().find(|n| n.id == updated.id) {
            Some(note) => {
                note.title.clone_from(&updated.title);
                note.content.clone_from(&updated.content);
                true
            }
            None => false,
        }
    }

    /// React to a pushed event.
    pub fn on_event(&mut self, event: &AppEvent) -> bool {
        match event {
            AppEvent::NoteUpdated { note } => self.apply_update(note),
            _ => false,
        }
    }

    /// Tear down the pinned window when the main window goes away.
    ///
    /// # Errors
    ///
    /// Returns the service failure, if any.
    pub async fn close(&mut self) -> Result<()> {
        self.api.close_pinned_window().await?;
        for note in &mut self.notes {
            note.pinned = false;
        }
        Ok(())
    }
}
