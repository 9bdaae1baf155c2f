//! Channel URL derivation.

use super::error::RealtimeError;

/// Socket.IO endpoint path.
const SOCKET_IO_PATH: &str = "/socket.io/";

/// Query selecting Engine.IO v4 over the websocket transport.
const TRANSPORT_QUERY: &str = "EIO=4&transport=websocket";

/// Build the websocket URL for a server address.
///
/// Accepts `http(s)://` or `ws(s)://` addresses. The scheme is mapped to its
/// websocket equivalent and the Socket.IO path and transport query are added
/// unless the address already names a `socket.io` path.
pub fn socket_url(address: &str) -> Result<String, RealtimeError> {
    let address = address.trim();
    let invalid = |reason: &str| RealtimeError::InvalidUrl {
        url: address.to_string(),
        reason: reason.to_string(),
    };

    let (scheme, rest) = address
        .split_once("://")
        .ok_or_else(|| invalid("missing scheme"))?;
    let ws_scheme = match scheme.to_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(invalid("scheme must be http, https, ws or wss")),
    };
    if rest.is_empty() || rest.starts_with('/') {
        return Err(invalid("missing host"));
    }

    if rest.contains("socket.io") {
        return Ok(format!("{}://{}", ws_scheme, rest));
    }
    Ok(format!(
        "{}://{}{}?{}",
        ws_scheme,
        rest.trim_end_matches('/'),
        SOCKET_IO_PATH,
        TRANSPORT_QUERY
    ))
}
