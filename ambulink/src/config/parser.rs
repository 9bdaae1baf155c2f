//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !is_http_url(v) {
                return Err(invalid(
                    "server",
                    "base_url",
                    v,
                    "must be a URL starting with 'http://' or 'https://'",
                ));
            }
            config.server.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = section.get("api_prefix") {
            config.server.api_prefix = v.trim().trim_matches('/').to_string();
        }
        if let Some(v) = section.get("request_timeout_secs") {
            config.server.request_timeout_secs = v
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    invalid(
                        "server",
                        "request_timeout_secs",
                        v,
                        "must be a positive integer (seconds)",
                    )
                })?;
        }
    }

    // [realtime] section
    if let Some(section) = ini.section(Some("realtime")) {
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !v.is_empty() {
                if !is_ws_or_http_url(v) {
                    return Err(invalid(
                        "realtime",
                        "url",
                        v,
                        "must start with ws://, wss://, http:// or https://",
                    ));
                }
                config.realtime.url = Some(v.to_string());
            }
        }
    }

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = section.get("access") {
            config.location.access = v
                .parse()
                .map_err(|_| invalid("location", "access", v, "must be 'granted' or 'denied'"))?;
        }
        if let Some(v) = section.get("udp_port") {
            config.location.udp_port = v
                .parse()
                .map_err(|_| invalid("location", "udp_port", v, "must be a port number"))?;
        }
        if let Some(v) = section.get("interval_ms") {
            config.location.interval_ms = v.parse().map_err(|_| {
                invalid(
                    "location",
                    "interval_ms",
                    v,
                    "must be a positive integer (milliseconds)",
                )
            })?;
        }
        if let Some(v) = section.get("min_displacement_m") {
            config.location.min_displacement_m = v
                .parse::<f64>()
                .ok()
                .filter(|m| *m >= 0.0)
                .ok_or_else(|| {
                    invalid(
                        "location",
                        "min_displacement_m",
                        v,
                        "must be a non-negative number (meters)",
                    )
                })?;
        }
    }

    // [session] section
    if let Some(section) = ini.section(Some("session")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.session.file = expand_tilde(v);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub(super) fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

pub(super) fn is_ws_or_http_url(value: &str) -> bool {
    is_http_url(value) || value.starts_with("ws://") || value.starts_with("wss://")
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationPermission;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_yields_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.server.base_url, crate::config::DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_server_section() {
        let config = parse(
            "[server]\nbase_url = https://api.example.org/\napi_prefix = /api/v2/\nrequest_timeout_secs = 30\n",
        )
        .unwrap();

        assert_eq!(config.server.base_url, "https://api.example.org");
        assert_eq!(config.server.api_prefix, "api/v2");
        assert_eq!(config.server.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_base_url() {
        let result = parse("[server]\nbase_url = ftp://nope\n");
        assert!(matches!(
            result,
            Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "base_url"
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = parse("[server]\nrequest_timeout_secs = 0\n");
        assert!(matches!(result, Err(ConfigFileError::InvalidValue { .. })));
    }

    #[test]
    fn test_location_section() {
        let config = parse(
            "[location]\naccess = DENIED\nudp_port = 4000\ninterval_ms = 5000\nmin_displacement_m = 5\n",
        )
        .unwrap();

        assert_eq!(config.location.access, LocationPermission::Denied);
        assert_eq!(config.location.udp_port, 4000);

        let policy = config.location.sampling_policy();
        assert_eq!(policy.interval.as_millis(), 5000);
        assert_eq!(policy.min_displacement_m, Some(5.0));
    }

    #[test]
    fn test_zero_displacement_disables_filter() {
        let config = parse("[location]\nmin_displacement_m = 0\n").unwrap();
        assert_eq!(config.location.sampling_policy().min_displacement_m, None);
    }

    #[test]
    fn test_negative_displacement_rejected() {
        let result = parse("[location]\nmin_displacement_m = -1\n");
        assert!(matches!(result, Err(ConfigFileError::InvalidValue { .. })));
    }

    #[test]
    fn test_empty_realtime_url_keeps_derived_default() {
        let config = parse("[realtime]\nurl =\n").unwrap();
        assert!(config.realtime.url.is_none());
    }

    #[test]
    fn test_session_file_tilde_expansion() {
        let config = parse("[session]\nfile = /tmp/ambulink-session.ini\n").unwrap();
        assert_eq!(
            config.session.file,
            PathBuf::from("/tmp/ambulink-session.ini")
        );
    }
}
