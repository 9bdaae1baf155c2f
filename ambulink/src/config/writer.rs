//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let realtime_url = config.realtime.url.as_deref().unwrap_or("");

    format!(
        r#"[server]
; Dispatch backend base URL (scheme + host + optional port)
base_url = {}
; Path prefix for every REST endpoint
api_prefix = {}
; Timeout in seconds for a single REST request
request_timeout_secs = {}

[realtime]
; Websocket URL for live location updates.
; Leave empty to derive it from server.base_url
url = {}

[location]
; Whether this device may read its location: granted or denied
access = {}
; UDP port receiving NMEA 0183 or XGPS datagrams from the GPS device
udp_port = {}
; Minimum interval between location updates (milliseconds)
interval_ms = {}
; Minimum movement in meters before a new update is sent (0 = disabled)
min_displacement_m = {}

[session]
; Where the partner session is persisted
file = {}

[logging]
; Log file path (cleared on every start)
file = {}
"#,
        config.server.base_url,
        config.server.api_prefix,
        config.server.request_timeout_secs,
        realtime_url,
        config.location.access.as_str(),
        config.location.udp_port,
        config.location.interval_ms,
        config.location.min_displacement_m,
        path_to_string(&config.session.file),
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_contains_every_section() {
        let output = to_config_string(&ConfigFile::default());

        for section in ["[server]", "[realtime]", "[location]", "[session]", "[logging]"] {
            assert!(output.contains(section), "missing {}", section);
        }
        assert!(output.contains("access = granted"));
    }

    #[test]
    fn test_output_parses_back() {
        let output = to_config_string(&ConfigFile::default());
        let ini = ini::Ini::load_from_str(&output).unwrap();
        assert!(super::super::parser::parse_ini(&ini).is_ok());
    }
}
