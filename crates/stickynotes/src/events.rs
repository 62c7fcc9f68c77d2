//! Broadcast of note and window events to every open surface.
//!
//! Delivery is best effort with no ordering guarantee across windows. A
//! subscriber that falls behind skips the missed events and keeps going;
//! the next `note-updated` carries the full note, so nothing accumulates.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::note::Note;
use crate::window::{Opacity, WindowId};

/// Name of the push channel carrying note updates.
pub const NOTE_UPDATED: &str = "note-updated";

/// An event pushed to windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum AppEvent {
    /// A note changed; windows showing it should redraw.
    NoteUpdated {
        /// The note as it should now be displayed.
        note: Note,
    },
    /// The pinned window was opened for a note.
    WindowOpened {
        /// The new window.
        window: WindowId,
        /// The note it shows.
        note: Note,
    },
    /// The pinned window was closed.
    WindowClosed {
        /// The window that went away.
        window: WindowId,
    },
    /// The pinned window opacity changed.
    OpacityChanged {
        /// The affected window.
        window: WindowId,
        /// The new opacity.
        opacity: Opacity,
    },
}

impl AppEvent {
    /// The note carried by a `note-updated` event.
    #[must_use]
    pub fn updated_note(&self) -> Option<&Note> {
        match self {
            Self::NoteUpdated { note } => Some(note),
            _ => None,
        }
    }
}

/// Sending half of the broadcast channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// Create a bus holding up to `capacity` undelivered events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Push an event to every subscriber. Returns how many received it.
    pub fn publish(&self, event: AppEvent) -> usize {
        if let Ok(count) = self.tx.send(event) {
            count
        } else {
            debug!("Event dropped, no open windows are listening");
            0
        }
    }

    /// Push a `note-updated` event.
    pub fn note_updated(&self, note: Note) -> usize {
        self.publish(AppEvent::NoteUpdated { note })
    }

    /// Start receiving events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Receiving half held by one window.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<AppEvent>,
}

impl Subscription {
    /// Wait for the next event. Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<AppEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Window fell behind, skipped {} event(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take an already delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<AppEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Window fell behind, skipped {} event(s)", skipped);
                }
                Err(_) => return None,
            }
        }
    }
}
