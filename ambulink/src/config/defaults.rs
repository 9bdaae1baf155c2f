//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::location::{LocationPermission, DEFAULT_SAMPLE_INTERVAL};

/// Default dispatch backend.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:9000";

/// Default REST path prefix.
pub const DEFAULT_API_PREFIX: &str = "api/v1";

/// Default REST request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default UDP port for GPS datagrams (the conventional NMEA-over-UDP port).
pub const DEFAULT_GPS_UDP_PORT: u16 = 10110;

/// Default minimum displacement (disabled).
pub const DEFAULT_MIN_DISPLACEMENT_M: f64 = 0.0;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "ambulink.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            realtime: RealtimeSettings { url: None },
            location: LocationSettings::default(),
            session: SessionSettings {
                file: crate::session::default_session_path(),
            },
            logging: LoggingSettings {
                file: default_log_path(),
            },
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            access: LocationPermission::Granted,
            udp_port: DEFAULT_GPS_UDP_PORT,
            interval_ms: DEFAULT_SAMPLE_INTERVAL.as_millis() as u64,
            min_displacement_m: DEFAULT_MIN_DISPLACEMENT_M,
        }
    }
}

/// Default log file (~/.ambulink/logs/ambulink.log).
pub fn default_log_path() -> PathBuf {
    config_directory().join("logs").join(DEFAULT_LOG_FILE)
}
