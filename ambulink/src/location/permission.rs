//! Location permission state.

use std::fmt;
use std::str::FromStr;

/// Whether the host allows reading the device location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationPermission {
    #[default]
    Granted,
    Denied,
}

impl LocationPermission {
    pub fn is_granted(&self) -> bool {
        matches!(self, LocationPermission::Granted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationPermission::Granted => "granted",
            LocationPermission::Denied => "denied",
        }
    }
}

impl FromStr for LocationPermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "granted" | "true" | "yes" | "on" => Ok(LocationPermission::Granted),
            "denied" | "false" | "no" | "off" => Ok(LocationPermission::Denied),
            other => Err(format!("unknown location permission '{}'", other)),
        }
    }
}

impl fmt::Display for LocationPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
