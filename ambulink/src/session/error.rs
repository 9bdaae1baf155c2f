//! Error types for session persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the session area.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session file exists but could not be parsed.
    #[error("Failed to read session file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The session file could not be written.
    #[error("Failed to write session file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
