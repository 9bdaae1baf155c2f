//! Location of `config.ini` and its load/save round trip.

use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::parser::parse_ini;
use super::settings::ConfigFile;
use super::writer::to_config_string;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value is present but unusable.
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load `~/.ambulink/config.ini`, or defaults when it does not exist.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_ini(&ini)
    }

    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write the file, creating its directory first.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let write_error = |source| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, to_config_string(self)).map_err(write_error)
    }

    /// Write a default file unless one exists. Returns its path.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

/// `~/.ambulink`, holding config, session and logs.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ambulink")
}

pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::{DEFAULT_API_PREFIX, DEFAULT_GPS_UDP_PORT, DEFAULT_SERVER_URL};
    use crate::location::LocationPermission;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();

        assert_eq!(config.server.base_url, DEFAULT_SERVER_URL);
        assert_eq!(config.server.api_prefix, DEFAULT_API_PREFIX);
        assert!(config.realtime.url.is_none());
        assert_eq!(config.location.access, LocationPermission::Granted);
        assert_eq!(config.location.udp_port, DEFAULT_GPS_UDP_PORT);
        assert!(config.session.file.ends_with("session.ini"));
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config.server.base_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_saved_values_load_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.server.base_url = "https://dispatch.example.org".to_string();
        config.realtime.url = Some("wss://rt.example.org/socket.io/".to_string());
        config.location.access = LocationPermission::Denied;
        config.location.interval_ms = 5000;
        config.location.min_displacement_m = 5.0;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.server.base_url, "https://dispatch.example.org");
        assert_eq!(
            loaded.realtime.url.as_deref(),
            Some("wss://rt.example.org/socket.io/")
        );
        assert_eq!(loaded.location.access, LocationPermission::Denied);
        assert_eq!(loaded.location.interval_ms, 5000);
        assert_eq!(loaded.location.min_displacement_m, 5.0);
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[server\nbase_url = x\n").unwrap();

        match ConfigFile::load_from(&path) {
            Err(ConfigFileError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected read error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_save_into_directory_path_fails() {
        let dir = TempDir::new().unwrap();
        let result = ConfigFile::default().save_to(dir.path());
        assert!(matches!(result, Err(ConfigFileError::Write { .. })));
    }
}
