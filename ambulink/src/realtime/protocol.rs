//! Engine.IO v4 / Socket.IO v5 text frames.
//!
//! Only the default namespace is supported. Binary frames are not used.

use serde_json::Value;

/// Engine.IO packet carrying a Socket.IO CONNECT to the default namespace.
pub const CONNECT_FRAME: &str = "40";

/// Engine.IO packet carrying a Socket.IO DISCONNECT.
pub const DISCONNECT_FRAME: &str = "41";

/// Engine.IO PONG.
pub const PONG_FRAME: &str = "3";

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Engine.IO OPEN with the handshake JSON.
    Open(Value),
    /// Engine.IO CLOSE.
    Close,
    /// Engine.IO PING (must be answered with PONG).
    Ping,
    /// Engine.IO PONG.
    Pong,
    /// Socket.IO CONNECT acknowledged by the server.
    Connected,
    /// Socket.IO DISCONNECT from the server.
    Disconnected,
    /// Socket.IO EVENT.
    Event { name: String, payload: Value },
    /// Socket.IO CONNECT_ERROR.
    ConnectError(Value),
    /// Anything we do not act on.
    Unsupported(String),
}

/// Encode a Socket.IO EVENT as an Engine.IO MESSAGE.
pub fn encode_event(event: &str, payload: &Value) -> String {
    let body = Value::Array(vec![Value::String(event.to_string()), payload.clone()]);
    format!("42{}", body)
}

/// Decode an inbound text frame.
pub fn decode(text: &str) -> Frame {
    let mut chars = text.chars();
    match chars.next() {
        Some('0') => Frame::Open(serde_json::from_str(chars.as_str()).unwrap_or(Value::Null)),
        Some('1') => Frame::Close,
        Some('2') => Frame::Ping,
        Some('3') => Frame::Pong,
        Some('4') => decode_socket_packet(chars.as_str()),
        _ => Frame::Unsupported(text.to_string()),
    }
}

fn decode_socket_packet(packet: &str) -> Frame {
    let mut chars = packet.chars();
    let kind = chars.next();
    let body = strip_namespace(chars.as_str());

    match kind {
        Some('0') => Frame::Connected,
        Some('1') => Frame::Disconnected,
        Some('2') => decode_event(body).unwrap_or_else(|| Frame::Unsupported(packet.to_string())),
        Some('4') => Frame::ConnectError(serde_json::from_str(body).unwrap_or(Value::Null)),
        _ => Frame::Unsupported(packet.to_string()),
    }
}

/// Drop a `/nsp,` prefix and any ack id digits before the JSON body.
fn strip_namespace(body: &str) -> &str {
    let body = match body.strip_prefix('/') {
        Some(rest) => rest.split_once(',').map(|(_, tail)| tail).unwrap_or(""),
        None => body,
    };
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn decode_event(body: &str) -> Option<Frame> {
    let Value::Array(mut items) = serde_json::from_str::<Value>(body).ok()? else {
        return None;
    };
    if items.is_empty() {
        return None;
    }
    let name = items.remove(0).as_str()?.to_string();
    let payload = if items.is_empty() {
        Value::Null
    } else {
        items.remove(0)
    };
    Some(Frame::Event { name, payload })
}
