//! Error types for vdisk_core.

use thiserror::Error;

/// Result type alias using vdisk_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during tree and persistence operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading or writing the disk image.
    ///
    /// A failed save is reported to the caller but does not roll back the
    /// in-memory mutation; memory and disk may diverge until the next
    /// successful save.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// The named entry does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A sibling of the same name already exists.
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: &'static str, name: String },

    /// Entry name is empty, reserved, or contains forbidden characters.
    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    /// File content cannot be represented in the disk image format.
    #[error("Invalid content: {reason}")]
    InvalidContent { reason: String },
}

impl Error {
    /// Create a NotFound error.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Error::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Create an InvalidName error.
    pub fn invalid_name(reason: impl Into<String>) -> Self {
        Error::InvalidName {
            reason: reason.into(),
        }
    }

    /// Create an InvalidContent error.
    pub fn invalid_content(reason: impl Into<String>) -> Self {
        Error::InvalidContent {
            reason: reason.into(),
        }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}
