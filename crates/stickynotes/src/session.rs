//! Process-wide UI session state.
//!
//! Tracks which note is shown in the pinned window and which window that is.
//! There is at most one pinned window at a time.

use crate::note::Note;
use crate::window::{Opacity, WindowId};

/// The open pinned window and the note it displays.
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedWindow {
    /// Host window id.
    pub window: WindowId,
    /// Snapshot of the displayed note.
    pub note: Note,
    /// Current window opacity.
    pub opacity: Opacity,
}

/// Session state owned by the service loop.
#[derive(Debug, Default)]
pub struct Session {
    pinned: Option<PinnedWindow>,
}

impl Session {
    /// A session with nothing pinned.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The pinned window, if one is open.
    #[must_use]
    pub fn pinned(&self) -> Option<&PinnedWindow> {
        self.pinned.as_ref()
    }

    /// The note shown in the pinned window.
    #[must_use]
    pub fn pinned_note(&self) -> Option<&Note> {
        self.pinned.as_ref().map(|p| &p.note)
    }

    /// Whether `id` is the note in the pinned window.
    #[must_use]
    pub fn is_pinned(&self, id: i64) -> bool {
        self.pinned_note().is_some_and(|n| n.id == id)
    }

    /// Whether `window` is the pinned window.
    #[must_use]
    pub fn is_pinned_window(&self, window: WindowId) -> bool {
        self.pinned.as_ref().is_some_and(|p| p.window == window)
    }

    /// Record a newly opened pinned window, returning the one it replaces.
    pub fn attach(&mut self, window: WindowId, note: Note, opacity: Opacity) -> Option<PinnedWindow> {
        self.pinned.replace(PinnedWindow {
            window,
            note,
            opacity,
        })
    }

    /// Forget the pinned window.
    pub fn detach(&mut self) -> Option<PinnedWindow> {
        self.pinned.take()
    }

    /// Replace the snapshot if `note` is the pinned one. Returns whether it was.
    pub fn refresh(&mut self, note: &Note) -> bool {
        match self.pinned.as_mut() {
            Some(pinned) if pinned.note.id == note.id => {
                pinned.note = note.clone();
                true
            }
            _ => false,
        }
    }

    /// Record a new opacity for the pinned window.
    pub fn set_opacity(&mut self, opacity: Opacity) {
        if let Some(pinned) = self.pinned.as_mut() {
            pinned.opacity = opacity;
        }
    }
}
