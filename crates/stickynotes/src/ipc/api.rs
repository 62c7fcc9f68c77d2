//! The client side of the message channel.

use crate::error::Result;
use crate::ipc::{Request, Response};
use crate::note::{NewNote, Note, NoteFields};

/// Anything that can send requests to the note service.
///
/// Implementors only provide [`NoteApi::invoke`]; the typed methods build the
/// request and unpack the response. A failure response comes back as
/// [`crate::Error::Failed`] carrying the service's message.
#[async_trait::async_trait]
pub trait NoteApi: Send + Sync {
    /// Send one request and wait for its response.
    async fn invoke(&self, request: Request) -> Response;

    /// Fetch every note, pinned first.
    async fn get_notes(&self) -> Result<Vec<Note>> {
        self.invoke(Request::GetNotes).await.into_notes()
    }

    /// Create a note.
    async fn save_note(&self, note: NewNote) -> Result<Note> {
        self.invoke(Request::SaveNote { note }).await.into_note()
    }

    /// Delete a note.
    async fn delete_note(&self, id: i64) -> Result<()> {
        self.invoke(Request::DeleteNote { id }).await.into_ack()
    }

    /// Replace a note's content.
    async fn update_note(&self, id: i64, content: String) -> Result<()> {
        self.invoke(Request::UpdateNote { id, content })
            .await
            .into_ack()
    }

    /// Flip a note's pinned flag, returning the new state.
    async fn toggle_pin(&self, id: i64) -> Result<bool> {
        self.invoke(Request::TogglePin { id }).await.into_pinned()
    }

    /// Show a note in the pinned window.
    async fn open_pinned_window(&self, id: i64) -> Result<Note> {
        self.invoke(Request::OpenPinnedWindow { id })
            .await
            .into_note()
    }

    /// Close the pinned window.
    async fn close_pinned_window(&self) -> Result<()> {
        self.invoke(Request::ClosePinnedWindow).await.into_ack()
    }

    /// The note shown in the pinned window.
    async fn get_pinned_note(&self) -> Result<Option<Note>> {
        self.invoke(Request::GetPinnedNote).await.into_pinned_note()
    }

    /// Change the pinned window's opacity.
    async fn set_pinned_window_opacity(&self, opacity: f64) -> Result<()> {
        self.invoke(Request::SetPinnedWindowOpacity { opacity })
            .await
            .into_ack()
    }

    /// Save an edit from the pinned window.
    async fn update_pinned_note(&self, id: i64, fields: NoteFields) -> Result<Note> {
        self.invoke(Request::UpdatePinnedNote { id, fields })
            .await
            .into_note()
    }

    /// Push a note to every window without saving it.
    async fn broadcast_note_update(&self, note: Note) -> Result<()> {
        self.invoke(Request::BroadcastNoteUpdate { note })
            .await
            .into_ack()
    }
}
