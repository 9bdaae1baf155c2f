//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;
use std::time::Duration;

use crate::location::{LocationPermission, SamplingPolicy};

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Backend REST server
    pub server: ServerSettings,
    /// Realtime location channel
    pub realtime: RealtimeSettings,
    /// Device location and sampling
    pub location: LocationSettings,
    /// Session persistence
    pub session: SessionSettings,
    /// Logging
    pub logging: LoggingSettings,
}

/// Backend server configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Base URL of the dispatch backend (scheme + host + optional port).
    pub base_url: String,
    /// Path prefix prepended to every REST endpoint.
    pub api_prefix: String,
    /// Timeout in seconds for a single REST request.
    pub request_timeout_secs: u64,
}

/// Realtime channel configuration.
#[derive(Debug, Clone)]
pub struct RealtimeSettings {
    /// Explicit websocket URL. None = derived from `server.base_url`.
    pub url: Option<String>,
}

/// Location configuration.
#[derive(Debug, Clone)]
pub struct LocationSettings {
    /// Whether this device may read its location.
    pub access: LocationPermission,
    /// UDP port receiving NMEA / XGPS datagrams from the GPS device.
    pub udp_port: u16,
    /// Minimum interval between delivered fixes, in milliseconds.
    pub interval_ms: u64,
    /// Minimum displacement in meters between delivered fixes.
    /// 0 disables the displacement filter.
    pub min_displacement_m: f64,
}

/// Session persistence configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Session file path
    pub file: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl ServerSettings {
    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl LocationSettings {
    /// Sampling policy described by these settings.
    pub fn sampling_policy(&self) -> SamplingPolicy {
        SamplingPolicy::new(
            Duration::from_millis(self.interval_ms),
            (self.min_displacement_m > 0.0).then_some(self.min_displacement_m),
        )
    }
}
