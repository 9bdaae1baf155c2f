//! Session store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use super::error::SessionError;
use super::keys;

/// Flat key-value area holding the partner session.
///
/// Implementations must be durable for the lifetime of the process at
/// minimum. Values are plain strings; there is no schema versioning.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Remove a single value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), SessionError>;

    /// Remove every value.
    fn clear(&self) -> Result<(), SessionError>;

    /// Partner id, preferring the login key over the profile alias.
    fn partner_id(&self) -> Option<String> {
        self.get(keys::USER_ID)
            .or_else(|| self.get(keys::USER_ID_ALIAS))
            .filter(|id| !id.is_empty())
    }

    /// Session key of the in-progress ride, if any.
    fn session_key(&self) -> Option<String> {
        self.get(keys::SESSION_KEY).filter(|k| !k.is_empty())
    }

    /// Snapshot of the whole session.
    fn snapshot(&self) -> PartnerSession {
        PartnerSession {
            partner_id: self.partner_id(),
            session_key: self.session_key(),
            name: self.get(keys::NAME),
            phone: self.get(keys::PHONE),
            email: self.get(keys::EMAIL),
            photo_url: self.get(keys::PHOTO_URL),
        }
    }
}

/// Read-only view of the persisted session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerSession {
    pub partner_id: Option<String>,
    pub session_key: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl PartnerSession {
    /// Whether a partner is logged in.
    pub fn is_logged_in(&self) -> bool {
        self.partner_id.is_some()
    }
}

/// Session store backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.values.lock().unwrap().clear();
        Ok(())
    }
}
