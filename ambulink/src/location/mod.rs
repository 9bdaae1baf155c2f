//! Device location: fixes, sampling policy and position providers.
//!
//! # Architecture
//!
//! ```text
//! PositionProvider (device)          LocationSource (policy)         consumer
//!   ├── UdpPositionProvider  ──┐       ├── permission gate
//!   │     (NMEA / XGPS)        ├──►    ├── interval throttle    ──►  next().await
//!   └── ManualPositionProvider ┘       └── displacement filter
//! ```
//!
//! A provider publishes every raw fix it sees on a broadcast channel and
//! remembers the last one. A [`LocationSource`] is opened against a provider
//! and turns that feed into the policy-filtered, non-restartable sequence
//! consumed by the tracking runner.
//!
//! # Sampling policy
//!
//! One [`SamplingPolicy`] covers both historical behaviors: the realtime
//! preset (2 s, no displacement filter) and the displacement-filtered preset
//! (5 s, 5 m). Which one applies is a configuration choice.

mod fix;
mod permission;
mod policy;
mod provider;
pub mod receiver;
mod source;

pub use fix::{distance_m, LocationFix, LocationSample};
pub use permission::LocationPermission;
pub use policy::{SampleFilter, SamplingPolicy, DEFAULT_SAMPLE_INTERVAL};
pub use provider::{ManualPositionProvider, PositionProvider};
pub use receiver::{UdpPositionProvider, UdpReceiverConfig};
pub use source::{LocationError, LocationSource};
