//! UDP GPS receiver.
//!
//! Listens for position datagrams on a UDP port and publishes them as
//! [`LocationFix`] values. Any GPS daemon or phone bridge that can forward
//! NMEA over UDP works, as does a simulator sending ForeFlight XGPS.
//!
//! # Supported sentences
//!
//! - **RMC** (`$--RMC`) with status `A`
//! - **GGA** (`$--GGA`) with a non-zero fix quality
//! - **XGPS** (`XGPS<name>,lon,lat,...`)
//!
//! # Example
//!
//! ```ignore
//! let provider = Arc::new(UdpPositionProvider::new(UdpReceiverConfig::default()));
//! let handle = provider.start(cancel.clone());
//! let mut source = LocationSource::open(&*provider, SamplingPolicy::default())?;
//! while let Some(fix) = source.next().await {
//!     println!("{}, {}", fix.latitude, fix.longitude);
//! }
//! ```

mod protocol;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::fix::LocationFix;
use super::permission::LocationPermission;
use super::provider::{FixHub, PositionProvider};
use super::source::LocationError;
use crate::config::DEFAULT_GPS_UDP_PORT;

pub use protocol::parse_datagram;

/// Maximum datagram size we expect.
const MAX_PACKET_SIZE: usize = 1024;

/// UDP receiver configuration.
#[derive(Debug, Clone)]
pub struct UdpReceiverConfig {
    /// UDP port to listen on.
    pub port: u16,

    /// Location permission reported by the provider.
    pub access: LocationPermission,

    /// Timeout for a single socket receive.
    pub recv_timeout: Duration,
}

impl Default for UdpReceiverConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_GPS_UDP_PORT,
            access: LocationPermission::Granted,
            recv_timeout: Duration::from_millis(500),
        }
    }
}

/// Position provider fed by UDP datagrams.
pub struct UdpPositionProvider {
    config: UdpReceiverConfig,
    hub: Arc<FixHub>,
}

impl UdpPositionProvider {
    pub fn new(config: UdpReceiverConfig) -> Self {
        let hub = Arc::new(FixHub::new(config.access));
        Self { config, hub }
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Start listening.
    ///
    /// Spawns the receive loop, which runs until `cancel` fires. Nothing is
    /// bound when permission is denied.
    pub fn start(&self, cancel: CancellationToken) -> JoinHandle<Result<(), LocationError>> {
        let config = self.config.clone();
        let hub = Arc::clone(&self.hub);
        tokio::spawn(async move {
            if !hub.permission().is_granted() {
                return Err(LocationError::PermissionDenied);
            }
            let socket = UdpSocket::bind(("0.0.0.0", config.port))
                .await
                .map_err(|source| LocationError::SocketBind {
                    port: config.port,
                    source,
                })?;
            run(socket, config, hub, cancel).await;
            Ok(())
        })
    }
}

impl PositionProvider for UdpPositionProvider {
    fn permission(&self) -> LocationPermission {
        self.hub.permission()
    }

    fn watch_permission(&self) -> watch::Receiver<LocationPermission> {
        self.hub.watch_permission()
    }

    fn subscribe(&self) -> broadcast::Receiver<LocationFix> {
        self.hub.subscribe()
    }

    fn last_known(&self) -> Option<LocationFix> {
        self.hub.last_known()
    }
}

async fn run(
    socket: UdpSocket,
    config: UdpReceiverConfig,
    hub: Arc<FixHub>,
    cancel: CancellationToken,
) {
    let local_addr = socket.local_addr().ok();
    info!(port = config.port, local_addr = ?local_addr, "GPS receiver started");

    let mut buffer = [0u8; MAX_PACKET_SIZE];
    let mut packets_received: u64 = 0;
    let mut fixes_published: u64 = 0;

    loop {
        let recv_result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = tokio::time::timeout(config.recv_timeout, socket.recv(&mut buffer)) => result,
        };

        match recv_result {
            Ok(Ok(len)) => {
                packets_received += 1;
                let data = &buffer[..len];

                match parse_datagram(data) {
                    Some(fix) => {
                        fixes_published += 1;
                        if fixes_published == 1 {
                            info!(
                                lat = format!("{:.5}", fix.latitude),
                                lon = format!("{:.5}", fix.longitude),
                                "First GPS fix"
                            );
                        } else {
                            trace!(lat = fix.latitude, lon = fix.longitude, "GPS fix #{}", fixes_published);
                        }
                        hub.publish(fix);
                    }
                    None if packets_received <= 5 => {
                        let preview = String::from_utf8_lossy(&data[..len.min(50)]);
                        debug!(packet_num = packets_received, preview = %preview, "Unparsed GPS datagram");
                    }
                    None => {}
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "UDP receive error");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Err(_) => trace!("No GPS data received (timeout)"),
        }
    }

    info!(packets_received, fixes_published, "GPS receiver stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UdpReceiverConfig::default();
        assert_eq!(config.port, DEFAULT_GPS_UDP_PORT);
        assert!(config.access.is_granted());
    }

    #[tokio::test]
    async fn test_start_refused_without_permission() {
        let provider = UdpPositionProvider::new(UdpReceiverConfig {
            access: LocationPermission::Denied,
            ..Default::default()
        });
        let result = provider.start(CancellationToken::new()).await.unwrap();
        assert!(matches!(result, Err(LocationError::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_receives_and_publishes_fix() {
        // Find a free port first
        let spare = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = spare.local_addr().unwrap().port();
        drop(spare);

        let provider = UdpPositionProvider::new(UdpReceiverConfig {
            port,
            ..Default::default()
        });
        let mut rx = provider.subscribe();
        let cancel = CancellationToken::new();
        let handle = provider.start(cancel.clone());

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let fix = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                sender
                    .send_to(b"XGPSTest,77.2090,28.6139,216.0,90.0,0.0", ("127.0.0.1", port))
                    .await
                    .unwrap();
                if let Ok(Ok(fix)) =
                    tokio::time::timeout(Duration::from_millis(100), rx.recv()).await
                {
                    return fix;
                }
            }
        })
        .await
        .unwrap();

        assert!((fix.latitude - 28.6139).abs() < 1e-9);
        assert!(provider.last_known().is_some());

        cancel.cancel();
        assert!(handle.await.unwrap().is_ok());
    }
}
