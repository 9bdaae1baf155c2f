//! Coordinator error type.

use thiserror::Error;

use crate::api::ApiError;
use crate::location::LocationError;
use crate::realtime::RealtimeError;
use crate::session::SessionError;

/// Errors surfaced by ride coordinator operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Realtime(#[from] RealtimeError),

    /// The accept response carried no session key. Nothing was applied.
    #[error("Session key missing in accept response")]
    MissingSessionKey,

    /// No partner id in the session store.
    #[error("Not logged in")]
    NotLoggedIn,

    /// No ride session key in the session store.
    #[error("No active ride session")]
    NoActiveSession,

    /// No location fix observed yet.
    #[error("No location fix available yet")]
    NoLocationFix,

    /// The backend refused the credentials.
    #[error("Login failed: {0}")]
    LoginRejected(String),
}
