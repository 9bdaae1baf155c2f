//! REST client for the dispatch backend.
//!
//! The [`DispatchApi`] trait is the seam between the ride coordinator and the
//! network. [`HttpDispatchApi`] implements it over `reqwest`; tests plug in
//! in-memory fakes.
//!
//! All endpoints are relative to `{base_url}/{api_prefix}`.

mod client;
mod error;
mod models;

pub use client::{DispatchApi, HttpDispatchApi};
pub use error::ApiError;
pub use models::{
    AcceptResponse, LoginResponse, MessageResponse, PartnerProfile, PartnerResponse,
    PartnerRideItem, PartnerRidesResponse, PendingRideItem, PendingRideResponse, RideQuery,
    StatusUpdate,
};
