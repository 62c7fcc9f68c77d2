//! The note service.
//!
//! [`App`] owns the store, the session state, the window host and the event
//! bus. Each message channel maps to one method; [`App::handle`] is the
//! boundary where errors are logged and turned into failure responses.

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{AppEvent, EventBus};
use crate::ipc::{Payload, Request, Response};
use crate::note::{NewNote, Note, NoteFields};
use crate::session::Session;
use crate::storage::Storage;
use crate::window::{Opacity, WindowHost, WindowId, WindowSpec};

/// Backend state for one running application.
#[derive(Debug)]
pub struct App {
    config: Config,
    storage: Storage,
    host: Box<dyn WindowHost>,
    events: EventBus,
    session: Session,
    main_window: Option<WindowId>,
}

impl App {
    /// Open the configured database and start the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or startup fails.
    pub fn open(config: Config, host: Box<dyn WindowHost>) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        Self::start(config, storage, host)
    }

    /// Start the service on an already opened store.
    ///
    /// Stale pins from a previous run are cleared (unless disabled) and the
    /// main window is opened.
    ///
    /// # Errors
    ///
    /// Returns an error if clearing pins or opening the main window fails.
    pub fn start(config: Config, storage: Storage, mut host: Box<dyn WindowHost>) -> Result<Self> {
        if config.storage.clear_pins_on_start {
            storage.clear_pins()?;
        }

        let main_window = host.open(&WindowSpec::main(&config.windows.main))?;
        let events = EventBus::new(config.sync.event_capacity);

        info!(
            "Note service started with {} note(s) in {}",
            storage.count()?,
            storage.path().display()
        );

        Ok(Self {
            config,
            storage,
            host,
            events,
            session: Session::new(),
            main_window: Some(main_window),
        })
    }

    /// The event bus windows subscribe to.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The underlying store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Current session state.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The window host.
    #[must_use]
    pub fn host(&self) -> &dyn WindowHost {
        self.host.as_ref()
    }

    /// The main window, until it is closed.
    #[must_use]
    pub fn main_window(&self) -> Option<WindowId> {
        self.main_window
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatch one request and wrap the outcome in a response.
    pub fn handle(&mut self, request: Request) -> Response {
        let channel = request.channel();
        debug!(channel, "Handling request");

        let result = match request {
            Request::GetNotes => self.get_notes().map(|notes| Some(Payload::Notes(notes))),
            Request::SaveNote { note } => self.save_note(&note).map(|n| Some(Payload::Note(n))),
            Request::DeleteNote { id } => self.delete_note(id).map(|()| None),
            Request::UpdateNote { id, content } => self.update_note(id, &content).map(|()| None),
            Request::TogglePin { id } => self.toggle_pin(id).map(|p| Some(Payload::Pinned(p))),
            Request::OpenPinnedWindow { id } => self
                .open_pinned_window(id)
                .map(|n| Some(Payload::Note(n))),
            Request::ClosePinnedWindow => self.close_pinned_window().map(|()| None),
            Request::GetPinnedNote => Ok(Some(Payload::PinnedNote(self.pinned_note()))),
            Request::SetPinnedWindowOpacity { opacity } => {
                self.set_pinned_window_opacity(opacity).map(|()| None)
            }
            Request::UpdatePinnedNote { id, fields } => self
                .update_pinned_note(id, &fields)
                .map(|n| Some(Payload::Note(n))),
            Request::BroadcastNoteUpdate { note } => {
                self.broadcast_note_update(note);
                Ok(None)
            }
        };

        if let Err(e) = &result {
            error!(channel, "Request failed: {}", e);
        }
        Response::from(result)
    }

    /// All notes, pinned first, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn get_notes(&self) -> Result<Vec<Note>> {
        self.storage.list_notes()
    }

    /// Persist a new note and return it with its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn save_note(&mut self, note: &NewNote) -> Result<Note> {
        let saved = self.storage.insert_note(note)?;
        if saved.pinned {
            self.storage.pin_exclusive(saved.id)?;
            self.close_window_unless_showing(saved.id)?;
        }
        info!("Saved note {}", saved.id);
        Ok(saved)
    }

    /// Delete a note, closing the pinned window if it showed that note.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if the note does not exist.
    pub fn delete_note(&mut self, id: i64) -> Result<()> {
        self.storage.delete_note(id)?;
        if self.session.is_pinned(id) {
            self.teardown_pinned(false)?;
        }
        info!("Deleted note {}", id);
        Ok(())
    }

    /// Replace a note's content and nothing else.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if the note does not exist.
    pub fn update_note(&mut self, id: i64, content: &str) -> Result<()> {
        self.storage.update_content(id, content)?;
        if self.session.is_pinned(id) {
            let note = self.storage.require_note(id)?;
            self.session.refresh(&note);
        }
        debug!("Updated content of note {}", id);
        Ok(())
    }

    /// Flip a note's pinned flag and return the new state.
    ///
    /// If the pinned window's note loses its pin as a result, the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if the note does not exist.
    pub fn toggle_pin(&mut self, id: i64) -> Result<bool> {
        let pinned = self.storage.toggle_pin(id)?;

        let window_note = self.session.pinned_note().map(|n| n.id);
        if let Some(window_note) = window_note {
            let still_pinned = self
                .storage
                .get_note(window_note)?
                .is_some_and(|n| n.pinned);
            if !still_pinned {
                self.teardown_pinned(false)?;
            }
        }

        info!("Note {} is now {}", id, if pinned { "pinned" } else { "unpinned" });
        Ok(pinned)
    }

    /// Show a note in the pinned window.
    ///
    /// Any existing pinned window is closed and its note unpinned first, so
    /// the pin moves exclusively to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if the note does not exist, or a window
    /// error if the host cannot open the window.
    pub fn open_pinned_window(&mut self, id: i64) -> Result<Note> {
        self.storage.require_note(id)?;
        self.teardown_pinned(true)?;

        self.storage.pin_exclusive(id)?;
        let note = self.storage.require_note(id)?;
        let spec = WindowSpec::pinned(&note, &self.config.windows.pinned)?;

        let window = match self.host.open(&spec) {
            Ok(window) => window,
            Err(e) => {
                if let Err(unpin) = self.storage.set_pinned(id, false) {
                    warn!("Could not unpin note {} after window failure: {}", id, unpin);
                }
                return Err(e);
            }
        };

        self.session.attach(window, note.clone(), spec.opacity);
        self.events.publish(AppEvent::WindowOpened {
            window,
            note: note.clone(),
        });
        info!("Pinned note {} in {}", id, window);
        Ok(note)
    }

    /// Close the pinned window and unpin its note. A no-op when nothing is pinned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or the host fails.
    pub fn close_pinned_window(&mut self) -> Result<()> {
        self.teardown_pinned(true).map(|_| ())
    }

    /// The note currently shown in the pinned window.
    #[must_use]
    pub fn pinned_note(&self) -> Option<Note> {
        self.session.pinned_note().cloned()
    }

    /// Change the pinned window's opacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WindowUnavailable`] without a pinned window and
    /// [`Error::InvalidOpacity`] for values outside 0.1 to 1.0.
    pub fn set_pinned_window_opacity(&mut self, value: f64) -> Result<()> {
        let window = self
            .session
            .pinned()
            .map(|p| p.window)
            .filter(|w| self.host.is_open(*w))
            .ok_or(Error::WindowUnavailable)?;
        let opacity = Opacity::new(value)?;

        self.host.set_opacity(window, opacity)?;
        self.session.set_opacity(opacity);
        self.events
            .publish(AppEvent::OpacityChanged { window, opacity });
        debug!("Set {} opacity to {}", window, opacity);
        Ok(())
    }

    /// Save an edit from the pinned window and broadcast the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when no field is given and
    /// [`Error::NoteNotFound`] if the note does not exist.
    pub fn update_pinned_note(&mut self, id: i64, fields: &NoteFields) -> Result<Note> {
        if fields.is_empty() {
            return Err(Error::invalid_request("Invalid update parameters"));
        }

        let note = self.storage.update_pinned(id, fields)?;
        if !self.session.is_pinned(id) {
            self.storage.pin_exclusive(id)?;
            self.close_window_unless_showing(id)?;
        }
        self.session.refresh(&note);
        let delivered = self.events.note_updated(note.clone());
        debug!("Pinned note {} saved, delivered to {} window(s)", id, delivered);
        Ok(note)
    }

    /// Push a note to every open window without persisting it.
    pub fn broadcast_note_update(&self, note: Note) -> usize {
        self.events.note_updated(note)
    }

    /// React to the user closing a window.
    ///
    /// Closing the pinned window unpins its note, same as
    /// [`App::close_pinned_window`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be updated.
    pub fn window_closed(&mut self, window: WindowId) -> Result<()> {
        if self.session.is_pinned_window(window) {
            self.teardown_pinned(true)?;
        } else if self.main_window == Some(window) {
            info!("Main window closed");
            self.main_window = None;
        } else {
            debug!("Ignoring close of unknown {}", window);
        }
        Ok(())
    }

    /// Close every window and release the store.
    ///
    /// # Errors
    ///
    /// Returns an error if tearing down the pinned window fails.
    pub fn shutdown(mut self) -> Result<()> {
        self.teardown_pinned(true)?;
        if let Some(main) = self.main_window.take() {
            self.host.close(main)?;
        }
        info!("Note service stopped");
        Ok(())
    }

    /// Close the pinned window if it shows a note other than `id`.
    ///
    /// The window's note has already lost its pin in the store.
    fn close_window_unless_showing(&mut self, id: i64) -> Result<()> {
        if self.session.pinned_note().is_some_and(|n| n.id != id) {
            self.teardown_pinned(false)?;
        }
        Ok(())
    }

    /// Close the pinned window, optionally unpinning its note in the store.
    ///
    /// Returns whether a window was open.
    fn teardown_pinned(&mut self, unpin: bool) -> Result<bool> {
        let Some(pinned) = self.session.pinned().cloned() else {
            return Ok(false);
        };

        if unpin {
            match self.storage.set_pinned(pinned.note.id, false) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!("Pinned note {} no longer exists", pinned.note.id);
                }
                Err(e) => return Err(e),
            }
        }

        self.host.close(pinned.window)?;
        self.session.detach();
        self.events.publish(AppEvent::WindowClosed {
            window: pinned.window,
        });
        info!("Closed pinned window for note {}", pinned.note.id);
        Ok(true)
    }
}
