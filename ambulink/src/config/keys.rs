//! Configuration key access and validation.
//!
//! Type-safe get/set of configuration values by dotted key name, used by the
//! `config` CLI command.

use std::str::FromStr;
use thiserror::Error;

use super::parser::{expand_tilde, is_http_url, is_ws_or_http_url};
use super::settings::ConfigFile;
use super::writer::path_to_string;
use crate::location::LocationPermission;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServerBaseUrl,
    ServerApiPrefix,
    ServerRequestTimeoutSecs,
    RealtimeUrl,
    LocationAccess,
    LocationUdpPort,
    LocationIntervalMs,
    LocationMinDisplacementM,
    SessionFile,
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "server.base_url").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ServerBaseUrl => "server.base_url",
            ConfigKey::ServerApiPrefix => "server.api_prefix",
            ConfigKey::ServerRequestTimeoutSecs => "server.request_timeout_secs",
            ConfigKey::RealtimeUrl => "realtime.url",
            ConfigKey::LocationAccess => "location.access",
            ConfigKey::LocationUdpPort => "location.udp_port",
            ConfigKey::LocationIntervalMs => "location.interval_ms",
            ConfigKey::LocationMinDisplacementM => "location.min_displacement_m",
            ConfigKey::SessionFile => "session.file",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Section part of the key (e.g., "server").
    pub fn section(&self) -> &'static str {
        self.name().split_once('.').map(|(s, _)| s).unwrap_or("")
    }

    /// Key part without the section (e.g., "base_url").
    pub fn key_name(&self) -> &'static str {
        self.name().split_once('.').map(|(_, k)| k).unwrap_or("")
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ServerBaseUrl => config.server.base_url.clone(),
            ConfigKey::ServerApiPrefix => config.server.api_prefix.clone(),
            ConfigKey::ServerRequestTimeoutSecs => config.server.request_timeout_secs.to_string(),
            ConfigKey::RealtimeUrl => config.realtime.url.clone().unwrap_or_default(),
            ConfigKey::LocationAccess => config.location.access.as_str().to_string(),
            ConfigKey::LocationUdpPort => config.location.udp_port.to_string(),
            ConfigKey::LocationIntervalMs => config.location.interval_ms.to_string(),
            ConfigKey::LocationMinDisplacementM => config.location.min_displacement_m.to_string(),
            ConfigKey::SessionFile => path_to_string(&config.session.file),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Set the value in a config file.
    ///
    /// The value is parsed and validated before anything is written.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        match self {
            ConfigKey::ServerBaseUrl => {
                if !is_http_url(value) {
                    return Err(self.rejected("must start with 'http://' or 'https://'"));
                }
                config.server.base_url = value.trim_end_matches('/').to_string();
            }
            ConfigKey::ServerApiPrefix => {
                config.server.api_prefix = value.trim_matches('/').to_string();
            }
            ConfigKey::ServerRequestTimeoutSecs => {
                config.server.request_timeout_secs = value
                    .parse()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| self.rejected("must be a positive integer"))?;
            }
            ConfigKey::RealtimeUrl => {
                if value.is_empty() {
                    config.realtime.url = None;
                } else if is_ws_or_http_url(value) {
                    config.realtime.url = Some(value.to_string());
                } else {
                    return Err(self.rejected("must start with ws://, wss://, http:// or https://"));
                }
            }
            ConfigKey::LocationAccess => {
                config.location.access = value
                    .parse::<LocationPermission>()
                    .map_err(|_| self.rejected("must be one of: granted, denied"))?;
            }
            ConfigKey::LocationUdpPort => {
                config.location.udp_port = value
                    .parse()
                    .map_err(|_| self.rejected("must be a port number (0-65535)"))?;
            }
            ConfigKey::LocationIntervalMs => {
                config.location.interval_ms = value
                    .parse()
                    .map_err(|_| self.rejected("must be a positive integer"))?;
            }
            ConfigKey::LocationMinDisplacementM => {
                config.location.min_displacement_m = value
                    .parse::<f64>()
                    .ok()
                    .filter(|m| *m >= 0.0)
                    .ok_or_else(|| self.rejected("must be a non-negative number"))?;
            }
            ConfigKey::SessionFile => {
                if value.is_empty() {
                    return Err(self.rejected("must be a valid path"));
                }
                config.session.file = expand_tilde(value);
            }
            ConfigKey::LoggingFile => {
                if value.is_empty() {
                    return Err(self.rejected("must be a valid path"));
                }
                config.logging.file = expand_tilde(value);
            }
        }
        Ok(())
    }

    fn rejected(&self, reason: &str) -> ConfigKeyError {
        ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::ServerBaseUrl,
            ConfigKey::ServerApiPrefix,
            ConfigKey::ServerRequestTimeoutSecs,
            ConfigKey::RealtimeUrl,
            ConfigKey::LocationAccess,
            ConfigKey::LocationUdpPort,
            ConfigKey::LocationIntervalMs,
            ConfigKey::LocationMinDisplacementM,
            ConfigKey::SessionFile,
            ConfigKey::LoggingFile,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_key_parsing() {
        assert_eq!(
            "server.base_url".parse::<ConfigKey>().unwrap(),
            ConfigKey::ServerBaseUrl
        );
        assert_eq!(
            "LOCATION.ACCESS".parse::<ConfigKey>().unwrap(),
            ConfigKey::LocationAccess
        );
        assert!(matches!(
            "nope.nothing".parse::<ConfigKey>(),
            Err(ConfigKeyError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_every_key_round_trips_its_name() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
    }

    #[test]
    fn test_section_and_key_name() {
        assert_eq!(ConfigKey::LocationUdpPort.section(), "location");
        assert_eq!(ConfigKey::LocationUdpPort.key_name(), "udp_port");
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();

        ConfigKey::ServerBaseUrl
            .set(&mut config, "https://dispatch.example.org/")
            .unwrap();
        assert_eq!(
            ConfigKey::ServerBaseUrl.get(&config),
            "https://dispatch.example.org"
        );

        ConfigKey::LocationAccess.set(&mut config, "denied").unwrap();
        assert_eq!(ConfigKey::LocationAccess.get(&config), "denied");

        ConfigKey::RealtimeUrl
            .set(&mut config, "wss://rt.example.org")
            .unwrap();
        ConfigKey::RealtimeUrl.set(&mut config, "").unwrap();
        assert!(config.realtime.url.is_none());
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = ConfigFile::default();

        assert!(ConfigKey::ServerBaseUrl.set(&mut config, "localhost").is_err());
        assert!(ConfigKey::ServerRequestTimeoutSecs
            .set(&mut config, "0")
            .is_err());
        assert!(ConfigKey::LocationUdpPort.set(&mut config, "70000").is_err());
        assert!(ConfigKey::LocationAccess.set(&mut config, "maybe").is_err());
        assert!(ConfigKey::LocationMinDisplacementM
            .set(&mut config, "-3")
            .is_err());

        assert_eq!(config.server.base_url, crate::config::DEFAULT_SERVER_URL);
    }
}
