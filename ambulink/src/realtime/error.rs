//! Realtime channel errors.

use thiserror::Error;

/// Errors that can occur setting up the realtime channel.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The configured or derived channel URL is unusable.
    #[error("Invalid realtime URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
