//! The floating pinned-note window.

use tracing::{debug, warn};

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::events::AppEvent;
use crate::ipc::NoteApi;
use crate::note::{Note, NoteFields};
use crate::window::Opacity;

/// State of the pinned window: the note being edited and the window opacity.
///
/// Title and content edits show up locally at once; saving is debounced so a
/// burst of keystrokes becomes one `update-pinned-note` followed by one
/// `broadcast-note-update`.
#[derive(Debug)]
pub struct PinnedNoteView<A> {
    api: A,
    note: Option<Note>,
    opacity: Opacity,
    step: f64,
    debouncer: Debouncer,
}

impl<A> PinnedNoteView<A>
where
    A: NoteApi + Clone + 'static,
{
    /// Create the view with the window's initial opacity and editor settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured opacity is out of range.
    pub fn new(api: A, config: &Config) -> Result<Self> {
        Ok(Self {
            api,
            note: None,
            opacity: Opacity::new(config.windows.pinned.opacity)?,
            step: config.editor.opacity_step,
            debouncer: Debouncer::new(config.debounce()),
        })
    }

    /// The note being shown.
    #[must_use]
    pub fn note(&self) -> Option<&Note> {
        self.note.as_ref()
    }

    /// Current window opacity.
    #[must_use]
    pub fn opacity(&self) -> Opacity {
        self.opacity
    }

    /// Whether an edit is waiting to be saved.
    #[must_use]
    pub fn has_pending_save(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Fetch the pinned note from the service.
    ///
    /// # Errors
    ///
    /// Returns the service failure, if any.
    pub async fn load(&mut self) -> Result<Option<&Note>> {
        self.note = self.api.get_pinned_note().await?;
        Ok(self.note.as_ref())
    }

    /// Replace the shown note if `updated` is the same note.
    pub fn apply_update(&mut self, updated: &Note) -> bool {
        match self.note.as_mut() {
            Some(note) if note.id == updated.id => {
                *note = updated.clone();
                true
            }
            _ => false,
        }
    }

    /// React to a pushed event.
    pub fn on_event(&mut self, event: &AppEvent) -> bool {
        match event {
            AppEvent::NoteUpdated { note } => self.apply_update(note),
            _ => false,
        }
    }

    /// Make the window one step more opaque.
    ///
    /// Returns `false` without contacting the service when already at the maximum.
    ///
    /// # Errors
    ///
    /// Returns the service failure, if any.
    pub async fn increase_opacity(&mut self) -> Result<bool> {
        self.change_opacity(self.step).await
    }

    /// Make the window one step more transparent.
    ///
    /// Returns `false` without contacting the service when already at the minimum.
    ///
    /// # Errors
    ///
    /// Returns the service failure, if any.
    pub async fn decrease_opacity(&mut self) -> Result<bool> {
        self.change_opacity(-self.step).await
    }

    async fn change_opacity(&mut self, delta: f64) -> Result<bool> {
        let Some(next) = self.opacity.step(delta) else {
            debug!("Opacity {} is already at its limit", self.opacity);
            return Ok(false);
        };
        self.api.set_pinned_window_opacity(next.get()).await?;
        self.opacity = next;
        Ok(true)
    }

    /// Change the title and schedule a save. Returns `false` when no note is shown.
    pub fn edit_title(&mut self, title: impl Into<String>) -> bool {
        let Some(note) = self.note.as_mut() else {
            return false;
        };
        note.title = title.into();
        note.pinned = true;
        self.schedule_save();
        true
    }

    /// Change the content and schedule a save. Returns `false` when no note is shown.
    pub fn edit_content(&mut self, content: impl Into<String>) -> bool {
        let Some(note) = self.note.as_mut() else {
            return false;
        };
        note.content = content.into();
        note.pinned = true;
        self.schedule_save();
        true
    }

    /// Wait for a scheduled save to finish.
    pub async fn flush(&mut self) {
        self.debouncer.wait().await;
    }

    fn schedule_save(&mut self) {
        let Some(note) = self.note.clone() else {
            return;
        };
        let api = self.api.clone();

        self.debouncer.schedule(async move {
            let id = note.id;
            let fields = NoteFields::both(note.title.clone(), note.content.clone());
            if let Err(e) = api.update_pinned_note(id, fields).await {
                warn!("Failed to save pinned note {}: {}", id, e);
                return;
            }
            if let Err(e) = api.broadcast_note_update(note).await {
                warn!("Failed to broadcast pinned note {}: {}", id, e);
            }
        });
    }
}
