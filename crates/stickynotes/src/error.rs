//! Error types for stickynotes.
//!
//! Every fallible operation in the crate returns [`Error`]. At the message
//! channel boundary errors are flattened into a failure response carrying the
//! display string, so the messages here are what a window ends up showing.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for stickynotes operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Note Errors ===
    /// No note exists with the given id.
    #[error("Note with ID {id} not found")]
    NoteNotFound {
        /// The id that was looked up.
        id: i64,
    },

    // === Channel Errors ===
    /// A request named a channel that is not part of the message channel.
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    /// A request carried arguments that cannot be acted on.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The note service loop has stopped and no longer accepts requests.
    #[error("note service is not running")]
    ServiceStopped,

    /// The service answered a request with a failure response.
    #[error("{0}")]
    Failed(String),

    // === Window Errors ===
    /// The pinned window is not open.
    #[error("pinned window is not available")]
    WindowUnavailable,

    /// An opacity outside the accepted range was requested.
    #[error("opacity {value} is out of range (expected 0.1 to 1.0)")]
    InvalidOpacity {
        /// The rejected value.
        value: f64,
    },

    /// A [`WindowHost`](crate::window::WindowHost) implementation failed to
    /// carry out an operation, e.g. the toolkit refused to create a window.
    #[error("window error: {0}")]
    Window(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for stickynotes operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a new window host error.
    #[must_use]
    pub fn window(message: impl Into<String>) -> Self {
        Self::Window(message.into())
    }

    /// Check if this error means the requested note does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoteNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_not_found_display() {
        let err = Error::NoteNotFound { id: 42 };
        assert_eq!(err.to_string(), "Note with ID 42 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_channel_display() {
        let err = Error::InvalidChannel("drop-tables".to_string());
        assert_eq!(err.to_string(), "Invalid channel: drop-tables");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_window_unavailable_display() {
        assert_eq!(
            Error::WindowUnavailable.to_string(),
            "pinned window is not available"
        );
    }

    #[test]
    fn test_invalid_opacity_display() {
        let err = Error::InvalidOpacity { value: 1.5 };
        let msg = err.to_string();
        assert!(msg.contains("1.5"));
        assert!(msg.contains("out of range"));
    }

    #[test]
    fn test_constructors() {
        assert_eq!(
            Error::internal("boom").to_string(),
            "internal error: boom"
        );
        assert_eq!(
            Error::invalid_request("missing fields").to_string(),
            "invalid request: missing fields"
        );
        assert_eq!(Error::window("gone").to_string(), "window error: gone");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/notes.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "opacity too low".to_string(),
        };
        assert!(err.to_string().contains("opacity too low"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
