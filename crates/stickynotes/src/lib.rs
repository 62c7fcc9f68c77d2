//! `stickynotes` - Local sticky notes with a pinned always-on-top window
//!
//! This library provides the note store, the note service that windows talk
//! to over a named-channel message protocol, and the window-side state for
//! the main list and the floating pinned note.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod app;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod ipc;
pub mod logging;
pub mod note;
pub mod session;
pub mod storage;
pub mod views;
pub mod window;

pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
pub use events::{AppEvent, EventBus, Subscription};
pub use ipc::{AppHandle, NoteApi, Request, Response};
pub use logging::init_logging;
pub use note::{NewNote, Note, NoteFields};
pub use storage::{NoteStats, Storage};
pub use window::{HeadlessHost, Opacity, WindowHost, WindowId};
