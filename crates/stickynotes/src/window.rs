//! Window surfaces.
//!
//! The backend never draws anything itself. It describes the windows it
//! wants through [`WindowSpec`] and asks a [`WindowHost`] to realize them.
//! A desktop toolkit implements the trait for real windows;
//! [`HeadlessHost`] keeps the same bookkeeping in memory for the stdio
//! front end and for tests.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{MainWindowConfig, PinnedWindowConfig};
use crate::error::{Error, Result};
use crate::note::Note;

/// Identifier of an open window, unique for the lifetime of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Window opacity, always within `[Opacity::MIN, Opacity::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Opacity(f64);

impl Opacity {
    /// Most transparent accepted value.
    pub const MIN: f64 = 0.1;
    /// Fully opaque.
    pub const MAX: f64 = 1.0;

    // Tolerance for values produced by repeated 0.1 steps.
    const EPSILON: f64 = 1e-9;

    /// Validate an opacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOpacity`] for NaN or values outside the range.
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite()
            && value >= Self::MIN - Self::EPSILON
            && value <= Self::MAX + Self::EPSILON
        {
            Ok(Self(value.clamp(Self::MIN, Self::MAX)))
        } else {
            Err(Error::InvalidOpacity { value })
        }
    }

    /// The raw value.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }

    /// The opacity moved by `delta`, rounded to hundredths.
    ///
    /// Returns `None` when the result would leave the accepted range, in
    /// which case the caller keeps the current value.
    #[must_use]
    pub fn step(self, delta: f64) -> Option<Self> {
        let next = ((self.0 + delta) * 100.0).round() / 100.0;
        Self::new(next).ok()
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl<'de> Deserialize<'de> for Opacity {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Which surface a window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// The note list.
    Main,
    /// The floating window showing one pinned note.
    Pinned,
}

/// Everything a host needs to create a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSpec {
    /// Which surface this is.
    pub kind: WindowKind,
    /// Title bar text.
    pub title: String,
    /// Initial width.
    pub width: u32,
    /// Initial height.
    pub height: u32,
    /// Minimum width, if constrained.
    pub min_width: Option<u32>,
    /// Minimum height, if constrained.
    pub min_height: Option<u32>,
    /// Keep above other windows.
    pub always_on_top: bool,
    /// Whether the user can resize.
    pub resizable: bool,
    /// Whether the maximize control is offered.
    pub maximizable: bool,
    /// Whether the minimize control is offered.
    pub minimizable: bool,
    /// Initial opacity.
    pub opacity: Opacity,
}

impl WindowSpec {
    /// The main list window.
    #[must_use]
    pub fn main(config: &MainWindowConfig) -> Self {
        Self {
            kind: WindowKind::Main,
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            min_width: None,
            min_height: None,
            always_on_top: config.always_on_top,
            resizable: true,
            maximizable: true,
            minimizable: true,
            opacity: Opacity::default(),
        }
    }

    /// The floating window for `note`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOpacity`] if the configured opacity is out of range.
    pub fn pinned(note: &Note, config: &PinnedWindowConfig) -> Result<Self> {
        Ok(Self {
            kind: WindowKind::Pinned,
            title: format!("Selected Note: {}", note.display_title()),
            width: config.width,
            height: config.height,
            min_width: Some(config.min_width),
            min_height: Some(config.min_height),
            always_on_top: config.always_on_top,
            resizable: true,
            maximizable: false,
            minimizable: false,
            opacity: Opacity::new(config.opacity)?,
        })
    }
}

/// The seam between the note service and a UI toolkit.
///
/// Implementations are driven from the service loop only, so methods take
/// `&mut self` and need no internal locking.
pub trait WindowHost: Send + fmt::Debug {
    /// Create and show a window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Window`] if the toolkit cannot create the window.
    fn open(&mut self, spec: &WindowSpec) -> Result<WindowId>;

    /// Close a window. Closing an unknown or already closed window is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the toolkit fails to close the window.
    fn close(&mut self, id: WindowId) -> Result<()>;

    /// Change a window's opacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WindowUnavailable`] if the window is not open.
    fn set_opacity(&mut self, id: WindowId, opacity: Opacity) -> Result<()>;

    /// Whether the window is still open.
    fn is_open(&self, id: WindowId) -> bool;

    /// Current opacity of an open window.
    fn opacity(&self, id: WindowId) -> Option<Opacity>;
}

/// State of one window tracked by [`HeadlessHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    /// The [`WindowSpec`] the window was opened with.
    pub spec: WindowSpec,
    /// Current opacity.
    pub opacity: Opacity,
}

/// A window host without a display.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    next_id: u64,
    windows: BTreeMap<WindowId, HeadlessWindow>,
}

impl HeadlessHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an open window.
    #[must_use]
    pub fn window(&self, id: WindowId) -> Option<&HeadlessWindow> {
        self.windows.get(&id)
    }

    /// Number of open windows.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.windows.len()
    }
}

impl WindowHost for HeadlessHost {
    fn open(&mut self, spec: &WindowSpec) -> Result<WindowId> {
        self.next_id += 1;
        let id = WindowId(self.next_id);
        debug!("Opening {:?} {} \"{}\"", spec.kind, id, spec.title);
        self.windows.insert(
            id,
            HeadlessWindow {
                spec: spec.clone(),
                opacity: spec.opacity,
            },
        );
        Ok(id)
    }

    fn close(&mut self, id: WindowId) -> Result<()> {
        if self.windows.remove(&id).is_some() {
            debug!("Closed {}", id);
        }
        Ok(())
    }

    fn set_opacity(&mut self, id: WindowId, opacity: Opacity) -> Result<()> {
        let window = self.windows.get_mut(&id).ok_or(Error::WindowUnavailable)?;
        window.opacity = opacity;
        Ok(())
    }

    fn is_open(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    fn opacity(&self, id: WindowId) -> Option<Opacity> {
        self.windows.get(&id).map(|w| w.opacity)
    }
}
