//! AmbuLink - ambulance partner dispatch client
//!
//! This library provides the partner side of an ambulance dispatch system:
//! logging in, toggling availability, handling emergency-call requests and
//! streaming live GPS location to the backend while a ride is in progress.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────────┐
//!                 │            RideCoordinator            │
//!                 │  board: online / pending / accepted   │
//!                 └──┬──────────┬──────────┬──────────┬───┘
//!                    │          │          │          │
//!              DispatchApi  SessionStore  Realtime  PositionProvider
//!               (REST)       (INI file)   Channel    (UDP / manual)
//!                                            ▲          │
//!                                            │    LocationSource
//!                                            └── TrackingService
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ambulink::rides::RideCoordinator;
//!
//! let coordinator = RideCoordinator::new(api, session, channel, provider, policy);
//! coordinator.login("partner@example.org", "secret").await?;
//! coordinator.refresh_all().await?;
//! let session_key = coordinator.accept("R1").await?;
//! // ... location streams in the background ...
//! coordinator.complete("R1").await?;
//! ```

pub mod api;
pub mod config;
pub mod location;
pub mod logging;
pub mod realtime;
pub mod rides;
pub mod session;
pub mod tracking;

/// Version of the AmbuLink library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
