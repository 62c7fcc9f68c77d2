//! Configuration management for stickynotes.
//!
//! Configuration is loaded with figment from defaults, a TOML file and
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::window::Opacity;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "sticky-notes";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "notes.sqlite";

/// Environment variable prefix.
const ENV_PREFIX: &str = "STICKYNOTES_";

/// Application configuration.
///
/// Sources, highest precedence first:
/// 1. Environment variables (`STICKYNOTES_`, nested with `__`, e.g.
///    `STICKYNOTES_EDITOR__DEBOUNCE_MS=250`)
/// 2. TOML config file at `~/.config/sticky-notes/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Window geometry and appearance.
    pub windows: WindowsConfig,
    /// Editor behavior.
    pub editor: EditorConfig,
    /// Message channel sizing.
    pub sync: SyncConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/sticky-notes/notes.sqlite`
    pub database_path: Option<PathBuf>,
    /// Unpin every note when the service starts.
    ///
    /// No pinned window survives a restart, so a stale flag would point at
    /// a window that does not exist.
    pub clear_pins_on_start: bool,
}

/// Window configuration for both surfaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsConfig {
    /// The main note list window.
    pub main: MainWindowConfig,
    /// The floating pinned note window.
    pub pinned: PinnedWindowConfig,
}

/// Main window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainWindowConfig {
    /// Window title.
    pub title: String,
    /// Initial width in logical pixels.
    pub width: u32,
    /// Initial height in logical pixels.
    pub height: u32,
    /// Keep the window above others.
    pub always_on_top: bool,
}

/// Pinned window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinnedWindowConfig {
    /// Initial width in logical pixels.
    pub width: u32,
    /// Initial height in logical pixels.
    pub height: u32,
    /// Minimum width in logical pixels.
    pub min_width: u32,
    /// Minimum height in logical pixels.
    pub min_height: u32,
    /// Opacity the window opens with.
    pub opacity: f64,
    /// Keep the window above others.
    pub always_on_top: bool,
}

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period after the last keystroke before a pinned edit is saved.
    pub debounce_ms: u64,
    /// Amount the pinned window opacity changes per step.
    pub opacity_step: f64,
    /// Markup length beyond which a note preview is considered truncated.
    pub preview_length: usize,
}

/// Message channel sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Capacity of the request queue in front of the service loop.
    pub request_capacity: usize,
    /// Capacity of the broadcast channel feeding open windows.
    pub event_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            clear_pins_on_start: true,
        }
    }
}

impl Default for MainWindowConfig {
    fn default() -> Self {
        Self {
            title: "Sticky Notes".to_string(),
            width: 400,
            height: 600,
            always_on_top: true,
        }
    }
}

impl Default for PinnedWindowConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 400,
            min_width: 100,
            min_height: 100,
            opacity: 0.8,
            always_on_top: true,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            opacity_step: 0.1,
            preview_length: 150,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_capacity: 32,
            event_capacity: 64,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let pinned = &self.windows.pinned;

        if Opacity::new(pinned.opacity).is_err() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "windows.pinned.opacity ({}) must be between {} and {}",
                    pinned.opacity,
                    Opacity::MIN,
                    Opacity::MAX
                ),
            });
        }

        if pinned.width < pinned.min_width || pinned.height < pinned.min_height {
            return Err(Error::ConfigValidation {
                message: format!(
                    "pinned window size {}x{} is smaller than its minimum {}x{}",
                    pinned.width, pinned.height, pinned.min_width, pinned.min_height
                ),
            });
        }

        if self.editor.debounce_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "editor.debounce_ms must be greater than 0".to_string(),
            });
        }

        if !(self.editor.opacity_step > 0.0 && self.editor.opacity_step <= 1.0) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "editor.opacity_step ({}) must be in (0, 1]",
                    self.editor.opacity_step
                ),
            });
        }

        if self.sync.request_capacity == 0 || self.sync.event_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "sync capacities must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the edit debounce delay as a Duration.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.editor.debounce_ms)
    }
}
