//! Realtime location channel.
//!
//! A single long-lived duplex connection to the dispatch backend, used to
//! push `shareLocation` messages while a ride is accepted.
//!
//! The backend speaks Socket.IO v5 over the Engine.IO v4 websocket
//! transport. [`SocketChannel`] implements just enough of that protocol to
//! join the default namespace, answer transport pings and emit events.
//!
//! Emission is fire-and-forget: an event emitted while the connection is
//! not established is dropped, never queued or replayed.

mod channel;
mod error;
pub mod protocol;
mod url;

pub use channel::{ConnectionState, EmitOutcome, InboundEvent, RealtimeChannel, SocketChannel};
pub use error::RealtimeError;
pub use url::socket_url;

use crate::location::LocationSample;

/// Event name carrying partner location samples.
pub const SHARE_LOCATION_EVENT: &str = "shareLocation";

/// Emit a location sample as a `shareLocation` event.
pub fn share_location<C>(channel: &C, sample: &LocationSample) -> EmitOutcome
where
    C: RealtimeChannel + ?Sized,
{
    match serde_json::to_value(sample) {
        Ok(payload) => channel.emit(SHARE_LOCATION_EVENT, payload),
        Err(_) => EmitOutcome::Dropped,
    }
}
