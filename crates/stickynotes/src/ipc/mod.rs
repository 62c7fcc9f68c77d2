//! The message channel between windows and the note service.
//!
//! Requests are named by channel (`save-note`, `toggle-pin`, ...) and carry
//! their arguments under `args`. Every request gets a [`Response`] envelope:
//! `success` plus either a payload or an error message. Failures never
//! escape as Rust errors across the channel.

mod api;
mod server;
pub mod stdio;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::events::NOTE_UPDATED;
use crate::note::{NewNote, Note, NoteFields};

pub use api::NoteApi;
pub use server::{spawn, AppHandle};

/// Request channels accepted by the service.
pub const REQUEST_CHANNELS: &[&str] = &[
    "get-notes",
    "save-note",
    "delete-note",
    "update-note",
    "toggle-pin",
    "open-pinned-window",
    "close-pinned-window",
    "get-pinned-note",
    "set-pinned-window-opacity",
    "update-pinned-note",
    "broadcast-note-update",
];

/// Whether `channel` is a known request or push channel.
#[must_use]
pub fn is_valid_channel(channel: &str) -> bool {
    channel == NOTE_UPDATED || REQUEST_CHANNELS.contains(&channel)
}

/// A request sent over the message channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "args", rename_all = "kebab-case")]
pub enum Request {
    /// Fetch every note.
    GetNotes,
    /// Create a note.
    SaveNote {
        /// The note to store.
        note: NewNote,
    },
    /// Delete a note.
    DeleteNote {
        /// Note id.
        id: i64,
    },
    /// Replace a note's content.
    UpdateNote {
        /// Note id.
        id: i64,
        /// New rich-text content.
        content: String,
    },
    /// Flip a note's pinned flag.
    TogglePin {
        /// Note id.
        id: i64,
    },
    /// Show a note in the floating window.
    OpenPinnedWindow {
        /// Note id.
        id: i64,
    },
    /// Close the floating window and unpin its note.
    ClosePinnedWindow,
    /// Fetch the note shown in the floating window.
    GetPinnedNote,
    /// Change the floating window's opacity.
    SetPinnedWindowOpacity {
        /// Requested opacity, 0.1 to 1.0.
        opacity: f64,
    },
    /// Save an edit made in the floating window and broadcast it.
    UpdatePinnedNote {
        /// Note id.
        id: i64,
        /// Fields to change.
        fields: NoteFields,
    },
    /// Push a note to every open window without persisting it.
    BroadcastNoteUpdate {
        /// The note to display.
        note: Note,
    },
}

impl Request {
    /// Parse a request from JSON, rejecting unknown channels by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] for an unknown or missing channel and
    /// [`Error::InvalidRequest`] when the arguments do not fit the channel.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let channel = value
            .get("channel")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        if !REQUEST_CHANNELS.contains(&channel) {
            return Err(Error::InvalidChannel(channel.to_string()));
        }
        let channel = channel.to_string();

        serde_json::from_value(value)
            .map_err(|e| Error::invalid_request(format!("bad arguments for '{channel}': {e}")))
    }

    /// The channel name of this request.
    #[must_use]
    pub fn channel(&self) -> &'static str {
        match self {
            Self::GetNotes => "get-notes",
            Self::SaveNote { .. } => "save-note",
            Self::DeleteNote { .. } => "delete-note",
            Self::UpdateNote { .. } => "update-note",
            Self::TogglePin { .. } => "toggle-pin",
            Self::OpenPinnedWindow { .. } => "open-pinned-window",
            Self::ClosePinnedWindow => "close-pinned-window",
            Self::GetPinnedNote => "get-pinned-note",
            Self::SetPinnedWindowOpacity { .. } => "set-pinned-window-opacity",
            Self::UpdatePinnedNote { .. } => "update-pinned-note",
            Self::BroadcastNoteUpdate { .. } => "broadcast-note-update",
        }
    }
}

/// Data returned by a successful request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// All notes.
    Notes(Vec<Note>),
    /// A single note.
    Note(Note),
    /// The pinned note, if any.
    PinnedNote(Option<Note>),
    /// A pinned flag after toggling.
    Pinned(bool),
}

/// The reply envelope for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Result data, if the operation returns any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Success without data.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    /// Success with data.
    #[must_use]
    pub fn with(payload: Payload) -> Self {
        Self {
            success: true,
            data: Some(payload),
            error: None,
        }
    }

    /// Failure carrying the error's message.
    #[must_use]
    pub fn failure(error: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }

    /// Convert back into a `Result`, turning a failure into [`Error::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Failed`] with the remote message when `success` is false.
    pub fn into_result(self) -> Result<Option<Payload>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(Error::Failed(
                self.error.unwrap_or_else(|| "request failed".to_string()),
            ))
        }
    }

    /// Expect a success without a payload.
    ///
    /// # Errors
    ///
    /// Returns the failure, if any.
    pub fn into_ack(self) -> Result<()> {
        self.into_result().map(|_| ())
    }

    /// Expect a list of notes.
    ///
    /// # Errors
    ///
    /// Returns the failure, or an internal error for a different payload.
    pub fn into_notes(self) -> Result<Vec<Note>> {
        match self.into_result()? {
            Some(Payload::Notes(notes)) => Ok(notes),
            other => Err(unexpected(other.as_ref())),
        }
    }

    /// Expect a single note.
    ///
    /// # Errors
    ///
    /// Returns the failure, or an internal error for a different payload.
    pub fn into_note(self) -> Result<Note> {
        match self.into_result()? {
            Some(Payload::Note(note)) => Ok(note),
            other => Err(unexpected(other.as_ref())),
        }
    }

    /// Expect the pinned note.
    ///
    /// # Errors
    ///
    /// Returns the failure, or an internal error for a different payload.
    pub fn into_pinned_note(self) -> Result<Option<Note>> {
        match self.into_result()? {
            Some(Payload::PinnedNote(note)) => Ok(note),
            other => Err(unexpected(other.as_ref())),
        }
    }

    /// Expect a pinned flag.
    ///
    /// # Errors
    ///
    /// Returns the failure, or an internal error for a different payload.
    pub fn into_pinned(self) -> Result<bool> {
        match self.into_result()? {
            Some(Payload::Pinned(pinned)) => Ok(pinned),
            other => Err(unexpected(other.as_ref())),
        }
    }
}

impl From<Result<Option<Payload>>> for Response {
    fn from(result: Result<Option<Payload>>) -> Self {
        match result {
            Ok(Some(payload)) => Self::with(payload),
            Ok(None) => Self::ok(),
            Err(e) => Self::failure(&e),
        }
    }
}

fn unexpected(payload: Option<&Payload>) -> Error {
    Error::internal(format!("unexpected response payload: {payload:?}"))
}
