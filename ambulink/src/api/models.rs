//! Request and response bodies.
//!
//! Response types are lenient: every field defaults when missing so a
//! partially populated body still decodes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangePasswordRequest<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

/// Body of accept and complete requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RideAssignment<'a> {
    pub ambulance_partner_id: &'a str,
}

/// Online/offline toggle with the partner's current position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub is_online: bool,
    pub lat: f64,
    pub lng: f64,
}

/// Login result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    pub token: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub status: Option<i64>,
    pub partner: Option<PartnerProfile>,
}

impl LoginResponse {
    /// Human-readable reason from the server, if any.
    pub fn reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Ambulance partner profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartnerProfile {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub image_url: String,
    pub vehicle_number: String,
    pub is_online: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartnerResponse {
    pub message: Option<String>,
    pub partner: Option<PartnerProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageResponse {
    pub message: Option<String>,
}

/// One entry of the global pending queue.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PendingRideItem {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PendingRideResponse {
    pub message: Option<String>,
    pub ride: Vec<PendingRideItem>,
}

/// A ride assigned to the partner.
///
/// The backend sends coordinates as strings; numbers are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartnerRideItem {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub is_location_avail: Option<bool>,
    pub address: String,
    pub is_call_accepted: bool,
    pub is_ride_accepted: bool,
    pub created_at: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartnerRidesResponse {
    pub message: Option<String>,
    pub address: Option<String>,
    pub ride: Vec<PartnerRideItem>,
}

/// Accept result: an arbitrary JSON object that should carry `sessionKey`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptResponse(pub Value);

impl AcceptResponse {
    /// The ride session key, if present and non-empty.
    pub fn session_key(&self) -> Option<&str> {
        self.0
            .get("sessionKey")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
    }
}

/// Status filter for the partner rides endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideQuery {
    Active,
    Complete,
}

impl RideQuery {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideQuery::Active => "active",
            RideQuery::Complete => "complete",
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_response_with_partner() {
        let json = r#"{
            "token": "jwt",
            "message": "Login successful",
            "status": 200,
            "partner": {
                "id": "p-42",
                "name": "Ravi",
                "phoneNumber": "9990001111",
                "email": "ravi@example.org",
                "imageUrl": "https://img/x.png",
                "vehicleNumber": "DL01AB1234",
                "isOnline": true
            }
        }"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        let partner = response.partner.unwrap();

        assert_eq!(response.token.as_deref(), Some("jwt"));
        assert_eq!(partner.id, "p-42");
        assert_eq!(partner.phone_number, "9990001111");
        assert!(partner.is_online);
    }

    #[test]
    fn test_login_response_error_reason() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"error": "Invalid credentials", "status": 401}"#).unwrap();
        assert!(response.partner.is_none());
        assert_eq!(response.reason(), Some("Invalid credentials"));
    }

    #[test]
    fn test_pending_rides_decode() {
        let json = r#"{"message": "ok", "ride": [
            {"id": "R1", "name": "Asha", "phoneNumber": "1", "createdAt": "2024-06-01T10:00:00Z"},
            {"id": "R2", "name": "Vikram"}
        ]}"#;
        let response: PendingRideResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.ride.len(), 2);
        assert_eq!(response.ride[1].id, "R2");
        assert_eq!(response.ride[1].phone_number, "");
    }

    #[test]
    fn test_partner_ride_coordinates() {
        let json = r#"{"message": "ok", "address": "Sector 5", "ride": [
            {"id": "R1", "name": "Asha", "isLocationAvail": true, "address": "Sector 5",
             "isCallAccepted": true, "isRideAccepted": true, "lat": "28.6139", "lng": 77.209},
            {"id": "R2", "lat": "", "lng": null}
        ]}"#;
        let response: PartnerRidesResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.ride[0].lat, Some(28.6139));
        assert_eq!(response.ride[0].lng, Some(77.209));
        assert_eq!(response.ride[0].is_location_avail, Some(true));
        assert_eq!(response.ride[1].lat, None);
        assert_eq!(response.ride[1].lng, None);
        assert_eq!(response.ride[1].is_location_avail, None);
    }

    #[test]
    fn test_accept_response_session_key() {
        assert_eq!(
            AcceptResponse(json!({"sessionKey": "sk-1", "message": "ok"})).session_key(),
            Some("sk-1")
        );
        assert_eq!(AcceptResponse(json!({"message": "ok"})).session_key(), None);
        assert_eq!(AcceptResponse(json!({"sessionKey": ""})).session_key(), None);
        assert_eq!(AcceptResponse(json!({"sessionKey": 12})).session_key(), None);
        assert_eq!(AcceptResponse(Value::Null).session_key(), None);
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(StatusUpdate {
            is_online: true,
            lat: 1.5,
            lng: 2.5,
        })
        .unwrap();
        assert_eq!(body, json!({"isOnline": true, "lat": 1.5, "lng": 2.5}));

        let body = serde_json::to_value(ChangePasswordRequest {
            old_password: "a",
            new_password: "b",
        })
        .unwrap();
        assert_eq!(body, json!({"oldPassword": "a", "newPassword": "b"}));

        let body = serde_json::to_value(RideAssignment {
            ambulance_partner_id: "p-1",
        })
        .unwrap();
        assert_eq!(body, json!({"ambulancePartnerId": "p-1"}));
    }
}
