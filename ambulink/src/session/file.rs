//! INI-file backed session store.
//!
//! The whole session lives in a single `[session]` section. Every mutation
//! rewrites the file so the session survives process restarts (an accepted
//! ride can be resumed with `track`).

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ini::Ini;

use super::error::SessionError;
use super::store::SessionStore;

const SECTION: &str = "session";

/// Session store persisted to an INI file.
pub struct FileSessionStore {
    path: PathBuf,
    ini: Mutex<Ini>,
}

impl FileSessionStore {
    /// Open the store at `path`, loading existing values if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let ini = if path.exists() {
            Ini::load_from_file(&path).map_err(|source| SessionError::Read {
                path: path.clone(),
                source,
            })?
        } else {
            Ini::new()
        };

        tracing::debug!(path = %path.display(), "Session store opened");

        Ok(Self {
            path,
            ini: Mutex::new(ini),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy and keep the copy only once it is on disk.
    ///
    /// `change` returns `false` when it left the session untouched.
    fn update<F>(&self, change: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Ini) -> bool,
    {
        let mut ini = self.ini.lock().unwrap();
        let mut next = ini.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next)?;
        *ini = next;
        Ok(())
    }

    fn persist(&self, ini: &Ini) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SessionError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        ini.write_to_file(&self.path)
            .map_err(|source| SessionError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let ini = self.ini.lock().unwrap();
        ini.section(Some(SECTION))
            .and_then(|s| s.get(key))
            .map(str::to_string)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.update(|ini| {
            ini.with_section(Some(SECTION)).set(key, value);
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.update(|ini| ini.delete_from(Some(SECTION), key).is_some())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.update(|ini| {
            *ini = Ini::new();
            true
        })
    }
}

/// Default session file (~/.ambulink/session.ini).
pub fn default_session_path() -> PathBuf {
    crate::config::config_directory().join("session.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::keys;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::open(dir.path().join("session.ini")).unwrap();

        assert!(store.partner_id().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.ini");

        {
            let store = FileSessionStore::open(&path).unwrap();
            store.set(keys::USER_ID, "p-42").unwrap();
            store.set(keys::SESSION_KEY, "sk-abc").unwrap();
        }

        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.partner_id().as_deref(), Some("p-42"));
        assert_eq!(reopened.session_key().as_deref(), Some("sk-abc"));
    }

    #[test]
    fn test_remove_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.ini");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(keys::USER_ID, "p-42").unwrap();
        store.set(keys::SESSION_KEY, "sk-abc").unwrap();
        store.remove(keys::SESSION_KEY).unwrap();
        store.remove(keys::SESSION_KEY).unwrap();

        let reopened = FileSessionStore::open(&path).unwrap();
        assert!(reopened.session_key().is_none());
        assert_eq!(reopened.partner_id().as_deref(), Some("p-42"));
    }

    #[test]
    fn test_clear_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.ini");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(keys::NAME, "Asha").unwrap();
        store.clear().unwrap();

        let reopened = FileSessionStore::open(&path).unwrap();
        assert!(reopened.get(keys::NAME).is_none());
    }

    #[test]
    fn test_failed_write_keeps_previous_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.ini");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(keys::USER_ID, "p-42").unwrap();
        store.set(keys::SESSION_KEY, "sk-old").unwrap();

        // A directory in place of the file makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(
            store.set(keys::SESSION_KEY, "sk-new"),
            Err(SessionError::Write { .. })
        ));
        assert_eq!(store.session_key().as_deref(), Some("sk-old"));

        assert!(store.remove(keys::SESSION_KEY).is_err());
        assert_eq!(store.session_key().as_deref(), Some("sk-old"));

        assert!(store.clear().is_err());
        assert_eq!(store.partner_id().as_deref(), Some("p-42"));
    }

    #[test]
    fn test_corrupt_file_reports_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.ini");
        std::fs::write(&path, "[session\nuser_id = 1\n").unwrap();

        let result = FileSessionStore::open(&path);
        assert!(matches!(result, Err(SessionError::Read { .. })));
    }
}
