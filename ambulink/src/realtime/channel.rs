//! Realtime channel trait and the websocket implementation.

use std::sync::{Arc, Mutex, RwLock};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::error::RealtimeError;
use super::protocol::{self, Frame, CONNECT_FRAME, DISCONNECT_FRAME, PONG_FRAME};
use super::url::socket_url;

/// Capacity of the inbound event broadcast channel.
const INBOUND_CHANNEL_CAPACITY: usize = 32;

/// Connection lifecycle as observed by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Result of an emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Handed to the connection for sending.
    Sent,
    /// Not connected; the message was discarded.
    Dropped,
}

/// A named event received from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub name: String,
    pub payload: Value,
}

/// Duplex channel to the dispatch backend.
///
/// Implementations hold at most one connection. `connect` on an open or
/// opening channel reuses it; reconnecting after `disconnect` needs another
/// explicit `connect`.
pub trait RealtimeChannel: Send + Sync + 'static {
    /// Open the connection if none is open or opening.
    fn connect(&self) -> Result<(), RealtimeError>;

    /// Send `event` if connected, otherwise drop it.
    fn emit(&self, event: &str, payload: Value) -> EmitOutcome;

    /// Close the connection and detach every listener.
    fn disconnect(&self);

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

impl<C: RealtimeChannel + ?Sized> RealtimeChannel for Arc<C> {
    fn connect(&self) -> Result<(), RealtimeError> {
        (**self).connect()
    }

    fn emit(&self, event: &str, payload: Value) -> EmitOutcome {
        (**self).emit(event, payload)
    }

    fn disconnect(&self) {
        (**self).disconnect()
    }

    fn state(&self) -> ConnectionState {
        (**self).state()
    }
}

/// One live connection: its task, outbound queue and state.
struct Connection {
    state: Arc<RwLock<ConnectionState>>,
    outbound: mpsc::UnboundedSender<String>,
    events: broadcast::Sender<InboundEvent>,
    cancel: CancellationToken,
}

impl Connection {
    fn state(&self) -> ConnectionState {
        *self.state.read().unwrap()
    }
}

/// Socket.IO channel over a tokio-tungstenite websocket.
///
/// `connect` must be called from within a tokio runtime; the handshake and
/// the read/write loop run on a spawned task.
pub struct SocketChannel {
    url: String,
    connection: Mutex<Option<Connection>>,
}

impl SocketChannel {
    /// Create a channel for a server address.
    ///
    /// `address` may be the REST base URL or an explicit websocket URL.
    pub fn new(address: &str) -> Result<Self, RealtimeError> {
        Ok(Self {
            url: socket_url(address)?,
            connection: Mutex::new(None),
        })
    }

    /// The websocket URL this channel connects to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Subscribe to server events on the current connection.
    ///
    /// Returns `None` when no connection is open. The receiver observes the
    /// stream closing once the connection is torn down.
    pub fn listen(&self) -> Option<broadcast::Receiver<InboundEvent>> {
        self.connection
            .lock()
            .unwrap()
            .as_ref()
            .map(|conn| conn.events.subscribe())
    }
}

impl RealtimeChannel for SocketChannel {
    fn connect(&self) -> Result<(), RealtimeError> {
        let mut guard = self.connection.lock().unwrap();
        if let Some(conn) = guard.as_ref() {
            if conn.state() != ConnectionState::Disconnected {
                debug!(url = %self.url, "Realtime channel already open, reusing");
                return Ok(());
            }
        }

        let state = Arc::new(RwLock::new(ConnectionState::Connecting));
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(INBOUND_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        tokio::spawn(run_connection(
            self.url.clone(),
            Arc::clone(&state),
            outbound_rx,
            events.clone(),
            cancel.clone(),
        ));

        info!(url = %self.url, "Realtime channel connecting");
        *guard = Some(Connection {
            state,
            outbound,
            events,
            cancel,
        });
        Ok(())
    }

    fn emit(&self, event: &str, payload: Value) -> EmitOutcome {
        let guard = self.connection.lock().unwrap();
        let Some(conn) = guard.as_ref() else {
            return EmitOutcome::Dropped;
        };
        if conn.state() != ConnectionState::Connected {
            return EmitOutcome::Dropped;
        }
        match conn.outbound.send(protocol::encode_event(event, &payload)) {
            Ok(()) => EmitOutcome::Sent,
            Err(_) => EmitOutcome::Dropped,
        }
    }

    fn disconnect(&self) {
        // Dropping the connection drops the event sender, closing listeners
        if let Some(conn) = self.connection.lock().unwrap().take() {
            conn.cancel.cancel();
            *conn.state.write().unwrap() = ConnectionState::Disconnected;
            info!(url = %self.url, "Realtime channel disconnected");
        }
    }

    fn state(&self) -> ConnectionState {
        self.connection
            .lock()
            .unwrap()
            .as_ref()
            .map(Connection::state)
            .unwrap_or(ConnectionState::Disconnected)
    }
}

impl Drop for SocketChannel {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.connection.lock() {
            if let Some(conn) = guard.take() {
                conn.cancel.cancel();
            }
        }
    }
}

/// Drive one websocket connection until it closes or is cancelled.
async fn run_connection(
    url: String,
    state: Arc<RwLock<ConnectionState>>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    events: broadcast::Sender<InboundEvent>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        _ = cancel.cancelled() => None,
        result = connect_async(url.as_str()) => match result {
            Ok((stream, _)) => Some(stream),
            Err(e) => {
                warn!(url = %url, error = %e, "Realtime connection failed");
                None
            }
        },
    };
    let Some(stream) = connected else {
        *state.write().unwrap() = ConnectionState::Disconnected;
        return;
    };

    let (mut write, mut read) = stream.split();
    let mut frames_sent: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Text(DISCONNECT_FRAME.to_string().into())).await;
                let _ = write.close().await;
                break;
            }
            Some(frame) = outbound_rx.recv() => {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    warn!(error = %e, "Realtime send failed");
                    break;
                }
                frames_sent += 1;
            }
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let reply = match handle_frame(protocol::decode(&text), &state, &events) {
                        FrameAction::Continue => None,
                        FrameAction::Reply(reply) => Some(reply),
                        FrameAction::Stop => break,
                    };
                    if let Some(reply) = reply {
                        if let Err(e) = write.send(Message::Text(reply.to_string().into())).await {
                            warn!(error = %e, "Realtime send failed");
                            break;
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Realtime server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Realtime transport error");
                    break;
                }
            },
        }
    }

    *state.write().unwrap() = ConnectionState::Disconnected;
    info!(frames_sent, "Realtime connection closed");
}

enum FrameAction {
    Continue,
    Reply(&'static str),
    Stop,
}

fn handle_frame(
    frame: Frame,
    state: &RwLock<ConnectionState>,
    events: &broadcast::Sender<InboundEvent>,
) -> FrameAction {
    match frame {
        Frame::Open(handshake) => {
            debug!(sid = %handshake["sid"], "Engine.IO handshake received");
            FrameAction::Reply(CONNECT_FRAME)
        }
        Frame::Ping => FrameAction::Reply(PONG_FRAME),
        Frame::Connected => {
            *state.write().unwrap() = ConnectionState::Connected;
            info!("Realtime channel connected");
            FrameAction::Continue
        }
        Frame::Event { name, payload } => {
            trace!(event = %name, "Realtime event received");
            let _ = events.send(InboundEvent { name, payload });
            FrameAction::Continue
        }
        Frame::ConnectError(reason) => {
            warn!(reason = %reason, "Realtime namespace connect refused");
            FrameAction::Stop
        }
        Frame::Close | Frame::Disconnected => FrameAction::Stop,
        Frame::Pong => FrameAction::Continue,
        Frame::Unsupported(raw) => {
            trace!(frame = %raw, "Ignoring realtime frame");
            FrameAction::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_derives_socket_url() {
        let channel = SocketChannel::new("http://localhost:9000").unwrap();
        assert_eq!(
            channel.url(),
            "ws://localhost:9000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_emit_while_disconnected_is_dropped() {
        let channel = SocketChannel::new("http://localhost:9000").unwrap();
        assert_eq!(
            channel.emit("shareLocation", json!({"userId": "p1"})),
            EmitOutcome::Dropped
        );
        assert!(channel.listen().is_none());
    }

    #[test]
    fn test_handle_frame_transitions() {
        let state = RwLock::new(ConnectionState::Connecting);
        let (events, mut rx) = broadcast::channel(4);

        assert!(matches!(
            handle_frame(Frame::Open(json!({"sid": "a"})), &state, &events),
            FrameAction::Reply(CONNECT_FRAME)
        ));
        assert!(matches!(
            handle_frame(Frame::Ping, &state, &events),
            FrameAction::Reply(PONG_FRAME)
        ));
        assert_eq!(*state.read().unwrap(), ConnectionState::Connecting);

        handle_frame(Frame::Connected, &state, &events);
        assert_eq!(*state.read().unwrap(), ConnectionState::Connected);

        handle_frame(
            Frame::Event {
                name: "rideUpdate".into(),
                payload: json!(1),
            },
            &state,
            &events,
        );
        assert_eq!(rx.try_recv().unwrap().name, "rideUpdate");

        assert!(matches!(
            handle_frame(Frame::Disconnected, &state, &events),
            FrameAction::Stop
        ));
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_server_ends_disconnected() {
        // Port 9 (discard) on loopback is expected to refuse connections
        let channel = SocketChannel::new("http://127.0.0.1:9").unwrap();
        channel.connect().unwrap();
        assert_ne!(channel.state(), ConnectionState::Connected);

        let mut settled = false;
        for _ in 0..100 {
            if channel.state() == ConnectionState::Disconnected {
                settled = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(settled);
        assert_eq!(
            channel.emit("shareLocation", json!({})),
            EmitOutcome::Dropped
        );
    }

    #[tokio::test]
    async fn test_disconnect_closes_listeners() {
        let channel = SocketChannel::new("http://127.0.0.1:9").unwrap();
        channel.connect().unwrap();
        let mut rx = channel.listen().unwrap();

        channel.disconnect();

        assert_eq!(channel.state(), ConnectionState::Disconnected);
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
