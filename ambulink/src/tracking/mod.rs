//! Background location tracking.
//!
//! The tracking runner keeps location sampling and realtime emission alive
//! independently of whoever started it. It consumes a [`LocationSource`] on
//! its own task and pushes one `shareLocation` message per fix.
//!
//! ```text
//! LocationSource ──next()──► TrackingService task ──emit──► RealtimeChannel
//!                                    ▲
//!                     TrackingHandle::stop() (CancellationToken)
//! ```
//!
//! [`LocationSource`]: crate::location::LocationSource

mod service;

pub use service::{TrackingHandle, TrackingService, TrackingStats};
