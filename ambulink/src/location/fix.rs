//! Location fix and sample types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// A single device position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// When the fix was taken (device clock).
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    /// Create a fix stamped with the current time.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }

    /// Whether the coordinates are within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to another fix in meters.
    pub fn distance_to(&self, other: &LocationFix) -> f64 {
        distance_m(
            (self.latitude, self.longitude),
            (other.latitude, other.longitude),
        )
    }
}

/// Location sample pushed over the realtime channel.
///
/// Serializes to the `shareLocation` payload:
/// `{"userId": ..., "latitude": ..., "longitude": ..., "sessionKey": ...}`.
/// `sessionKey` is omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
}

impl LocationSample {
    /// Tag a fix with the partner identity and ride session key.
    pub fn from_fix(fix: &LocationFix, user_id: &str, session_key: Option<&str>) -> Self {
        Self {
            user_id: user_id.to_string(),
            latitude: fix.latitude,
            longitude: fix.longitude,
            session_key: session_key.map(str::to_string),
        }
    }
}

/// Great-circle distance between two (lat, lon) points in meters.
///
/// Uses the haversine formula.
pub fn distance_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1 * DEG_TO_RAD;
    let lat2_rad = lat2 * DEG_TO_RAD;
    let delta_lat = (lat2 - lat1) * DEG_TO_RAD;
    let delta_lon = (lon2 - lon1) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_zero() {
        assert_eq!(distance_m((12.97, 77.59), (12.97, 77.59)), 0.0);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // One degree of latitude is ~111.2 km everywhere
        let d = distance_m((0.0, 0.0), (1.0, 0.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_distance_small_offset() {
        // 0.0001 degrees latitude is ~11 m
        let d = distance_m((28.6139, 77.2090), (28.6140, 77.2090));
        assert!(d > 10.0 && d < 12.5, "got {}", d);
    }

    #[test]
    fn test_fix_validity() {
        assert!(LocationFix::new(28.6, 77.2).is_valid());
        assert!(!LocationFix::new(91.0, 0.0).is_valid());
        assert!(!LocationFix::new(0.0, -181.0).is_valid());
        assert!(!LocationFix::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_sample_payload_with_session_key() {
        let fix = LocationFix::new(28.6139, 77.209);
        let sample = LocationSample::from_fix(&fix, "p-1", Some("sk-1"));
        let json = serde_json::to_value(&sample).unwrap();

        assert_eq!(json["userId"], "p-1");
        assert_eq!(json["latitude"], 28.6139);
        assert_eq!(json["longitude"], 77.209);
        assert_eq!(json["sessionKey"], "sk-1");
    }

    #[test]
    fn test_sample_payload_omits_missing_session_key() {
        let fix = LocationFix::new(1.0, 2.0);
        let sample = LocationSample::from_fix(&fix, "p-1", None);
        let json = serde_json::to_value(&sample).unwrap();

        assert!(json.get("sessionKey").is_none());
        assert_eq!(json.as_object().unwrap().len(), 3);
    }
}
