//! Partner session persistence.
//!
//! The session is a flat key-value area holding the authenticated partner's
//! identity, the ride session key and a few cached profile fields. Nearly
//! every other component reads it; only login, profile fetch and the ride
//! lifecycle write it.
//!
//! # Keys
//!
//! | Key          | Written by              | Cleared by        |
//! |--------------|-------------------------|-------------------|
//! | `user_id`    | login                   | logout            |
//! | `userId`     | login, profile fetch    | logout            |
//! | `name`       | login, profile fetch    | logout            |
//! | `phone`      | login, profile fetch    | logout            |
//! | `email`      | login, profile fetch    | logout            |
//! | `photoUrl`   | profile fetch           | logout            |
//! | `sessionKey` | ride accept             | ride complete     |
//!
//! # Implementations
//!
//! - [`FileSessionStore`] - INI file, written through on every mutation
//! - [`MemorySessionStore`] - process-local map (tests, embedding)

mod error;
mod file;
pub mod keys;
mod store;

pub use error::SessionError;
pub use file::{default_session_path, FileSessionStore};
pub use store::{MemorySessionStore, PartnerSession, SessionStore};
