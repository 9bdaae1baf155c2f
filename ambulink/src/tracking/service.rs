//! Tracking runner task and its handle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::location::{LocationSample, LocationSource};
use crate::realtime::{share_location, EmitOutcome, RealtimeChannel};

/// Counters reported when a runner stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingStats {
    /// Fixes delivered by the location source.
    pub fixes: u64,
    /// Samples handed to the channel.
    pub sent: u64,
    /// Samples dropped because the channel was not connected.
    pub dropped: u64,
}

/// Starts tracking runners.
pub struct TrackingService;

impl TrackingService {
    /// Spawn a runner emitting each fix from `source` over `channel`.
    ///
    /// Every sample is tagged with `partner_id` and, when present,
    /// `session_key`. Must be called from within a tokio runtime.
    pub fn start<C>(
        channel: Arc<C>,
        source: LocationSource,
        partner_id: String,
        session_key: Option<String>,
    ) -> TrackingHandle
    where
        C: RealtimeChannel + ?Sized,
    {
        let shutdown_token = CancellationToken::new();
        let task_token = shutdown_token.clone();
        let key = session_key.clone();

        info!(partner_id = %partner_id, has_session_key = session_key.is_some(), "Tracking started");

        let handle = tokio::spawn(async move {
            run(channel, source, partner_id, session_key, task_token).await
        });

        TrackingHandle {
            shutdown_token,
            handle: Some(handle),
            session_key: key,
        }
    }
}

async fn run<C>(
    channel: Arc<C>,
    mut source: LocationSource,
    partner_id: String,
    session_key: Option<String>,
    shutdown: CancellationToken,
) -> TrackingStats
where
    C: RealtimeChannel + ?Sized,
{
    let mut stats = TrackingStats::default();

    loop {
        let fix = tokio::select! {
            _ = shutdown.cancelled() => break,
            fix = source.next() => fix,
        };
        let Some(fix) = fix else {
            info!("Location source ended, tracking stops");
            break;
        };

        stats.fixes += 1;
        let sample = LocationSample::from_fix(&fix, &partner_id, session_key.as_deref());
        match share_location(channel.as_ref(), &sample) {
            EmitOutcome::Sent => {
                stats.sent += 1;
                trace!(lat = fix.latitude, lon = fix.longitude, "Location sample sent");
            }
            EmitOutcome::Dropped => {
                stats.dropped += 1;
                trace!(lat = fix.latitude, lon = fix.longitude, "Location sample dropped (not connected)");
            }
        }
    }

    info!(fixes = stats.fixes, sent = stats.sent, dropped = stats.dropped, "Tracking stopped");
    stats
}

/// Handle to a running tracker.
///
/// Dropping the handle cancels the runner without waiting for it.
pub struct TrackingHandle {
    shutdown_token: CancellationToken,
    handle: Option<JoinHandle<TrackingStats>>,
    session_key: Option<String>,
}

impl TrackingHandle {
    /// Whether the runner task is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Session key the runner tags samples with.
    pub fn session_key(&self) -> Option<&str> {
        self.session_key.as_deref()
    }

    /// Stop the runner and wait for it to finish.
    pub async fn stop(mut self) -> TrackingStats {
        self.shutdown_token.cancel();
        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(stats) => stats,
                Err(e) => {
                    tracing::error!("Tracking task panicked: {}", e);
                    TrackingStats::default()
                }
            },
            None => TrackingStats::default(),
        }
    }

    /// Wait for the runner to end on its own (source exhausted).
    pub async fn finished(mut self) -> TrackingStats {
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => TrackingStats::default(),
        }
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}
