//! Ride state coordination.
//!
//! [`RideCoordinator`] owns the partner's view of dispatch: online status,
//! the global pending queue and the partner's accepted rides. Every
//! lifecycle transition goes to the backend first and is followed by a full
//! refresh; lists are always replaced wholesale, never diffed.
//!
//! # Accept flow
//!
//! ```text
//! accept(id)
//!   ├── open LocationSource        (PermissionDenied → nothing happened)
//!   ├── PATCH ride/accept          (ApiError → nothing happened)
//!   ├── sessionKey in response?    (MissingSessionKey → nothing happened)
//!   ├── persist sessionKey
//!   ├── RealtimeChannel::connect   (error → sessionKey restored)
//!   ├── TrackingService::start
//!   └── refresh pending + active
//! ```

mod board;
mod coordinator;
mod error;

pub use board::{Ride, RideBoard, RideStatus};
pub use coordinator::RideCoordinator;
pub use error::DispatchError;
