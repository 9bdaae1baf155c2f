//! Ride and board snapshot types.

use std::fmt;

use crate::api::{PartnerRideItem, PendingRideItem};

/// Lifecycle state of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideStatus {
    Pending,
    Accepted,
    Complete,
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RideStatus::Pending => "pending",
            RideStatus::Accepted => "accepted",
            RideStatus::Complete => "complete",
        })
    }
}

/// An emergency call as seen by the partner.
#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    pub id: String,
    pub patient_name: String,
    pub phone_number: String,
    pub address: Option<String>,
    /// Pickup coordinates, populated once accepted.
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub status: RideStatus,
    pub created_at: String,
    pub is_location_available: Option<bool>,
}

impl Ride {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lng)
    }

    pub(crate) fn from_pending(item: PendingRideItem) -> Self {
        Self {
            id: item.id,
            patient_name: item.name,
            phone_number: item.phone_number,
            address: None,
            lat: None,
            lng: None,
            status: RideStatus::Pending,
            created_at: item.created_at,
            is_location_available: None,
        }
    }

    pub(crate) fn from_partner(item: PartnerRideItem, status: RideStatus) -> Self {
        Self {
            id: item.id,
            patient_name: item.name,
            phone_number: item.phone_number,
            address: Some(item.address).filter(|a| !a.is_empty()),
            lat: item.lat,
            lng: item.lng,
            status,
            created_at: item.created_at,
            is_location_available: item.is_location_avail,
        }
    }
}

/// Snapshot of the coordinator state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RideBoard {
    /// Last known online flag. None until a profile load or status change.
    pub online: Option<bool>,
    pub pending: Vec<Ride>,
    pub accepted: Vec<Ride>,
}

impl RideBoard {
    /// The ride currently in progress, if any.
    pub fn active_ride(&self) -> Option<&Ride> {
        self.accepted.first()
    }
}
