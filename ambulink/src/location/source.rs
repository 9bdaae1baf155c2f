//! Policy-filtered location sequence.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::fix::LocationFix;
use super::permission::LocationPermission;
use super::policy::{SampleFilter, SamplingPolicy};
use super::provider::PositionProvider;

/// Errors from the location layer.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    /// The host has not granted location access.
    #[error("Location permission not granted")]
    PermissionDenied,

    /// Failed to bind the GPS receiver socket.
    #[error("Failed to bind GPS receiver on port {port}: {source}")]
    SocketBind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// A started location sequence.
///
/// Starts with the provider's last known fix, then yields new fixes that
/// satisfy the sampling policy. The sequence ends for good when location
/// access is revoked or the provider goes away; open a new one to start
/// again.
#[derive(Debug)]
pub struct LocationSource {
    rx: broadcast::Receiver<LocationFix>,
    access: watch::Receiver<LocationPermission>,
    seed: Option<LocationFix>,
    filter: SampleFilter,
    finished: bool,
}

impl LocationSource {
    /// Start a sequence against `provider`.
    ///
    /// Fails with [`LocationError::PermissionDenied`] without subscribing when
    /// location access is not granted.
    pub fn open<P>(provider: &P, policy: SamplingPolicy) -> Result<Self, LocationError>
    where
        P: PositionProvider + ?Sized,
    {
        let access = provider.watch_permission();
        if !access.borrow().is_granted() {
            debug!("Location source refused: permission denied");
            return Err(LocationError::PermissionDenied);
        }

        let rx = provider.subscribe();
        Ok(Self {
            rx,
            access,
            seed: provider.last_known(),
            filter: SampleFilter::new(policy),
            finished: false,
        })
    }

    pub fn policy(&self) -> &SamplingPolicy {
        self.filter.policy()
    }

    /// Wait for the next fix that passes the policy.
    pub async fn next(&mut self) -> Option<LocationFix> {
        if self.finished {
            return None;
        }
        if let Some(fix) = self.seed.take() {
            if self.admit(&fix) {
                return Some(fix);
            }
        }

        loop {
            tokio::select! {
                biased;

                received = self.rx.recv() => match received {
                    Ok(fix) => {
                        if !self.access.borrow().is_granted() {
                            return self.finish("Location permission revoked");
                        }
                        if self.admit(&fix) {
                            return Some(fix);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        trace!(skipped, "Location source lagged behind provider");
                    }
                    Err(RecvError::Closed) => return self.finish("Position provider closed"),
                },

                changed = self.access.changed() => {
                    if changed.is_err() {
                        return self.finish("Position provider closed");
                    }
                    if !self.access.borrow().is_granted() {
                        return self.finish("Location permission revoked");
                    }
                }
            }
        }
    }

    fn admit(&mut self, fix: &LocationFix) -> bool {
        if !fix.is_valid() {
            trace!(lat = fix.latitude, lon = fix.longitude, "Dropping invalid fix");
            return false;
        }
        self.filter.accept(fix, Instant::now())
    }

    fn finish(&mut self, reason: &str) -> Option<LocationFix> {
        debug!(reason, "Location source finished");
        self.finished = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::location::ManualPositionProvider;

    fn unthrottled() -> SamplingPolicy {
        SamplingPolicy::new(Duration::ZERO, None)
    }

    #[test]
    fn test_open_refuses_without_permission() {
        let provider = ManualPositionProvider::new(LocationPermission::Denied);
        let result = LocationSource::open(&provider, SamplingPolicy::default());
        assert!(matches!(result, Err(LocationError::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_yields_pushed_fixes() {
        let provider = ManualPositionProvider::default();
        let mut source = LocationSource::open(&provider, unthrottled()).unwrap();

        provider.push(LocationFix::new(1.0, 2.0));
        provider.push(LocationFix::new(3.0, 4.0));

        assert_eq!(source.next().await.unwrap().latitude, 1.0);
        assert_eq!(source.next().await.unwrap().latitude, 3.0);
    }

    #[tokio::test]
    async fn test_skips_invalid_fixes() {
        let provider = ManualPositionProvider::default();
        let mut source = LocationSource::open(&provider, unthrottled()).unwrap();

        provider.push(LocationFix::new(123.0, 0.0));
        provider.push(LocationFix::new(10.0, 20.0));

        assert_eq!(source.next().await.unwrap().latitude, 10.0);
    }

    #[tokio::test]
    async fn test_throttles_by_interval() {
        let provider = ManualPositionProvider::default();
        let policy = SamplingPolicy::new(Duration::from_secs(3600), None);
        let mut source = LocationSource::open(&provider, policy).unwrap();

        provider.push(LocationFix::new(1.0, 1.0));
        provider.push(LocationFix::new(2.0, 2.0));
        assert_eq!(source.next().await.unwrap().latitude, 1.0);

        let second = tokio::time::timeout(Duration::from_millis(50), source.next()).await;
        assert!(second.is_err(), "second fix should be throttled");
    }

    #[tokio::test]
    async fn test_starts_from_last_known_fix() {
        let provider = ManualPositionProvider::default();
        provider.push(LocationFix::new(5.0, 6.0));

        let mut source = LocationSource::open(&provider, unthrottled()).unwrap();
        provider.push(LocationFix::new(7.0, 8.0));

        assert_eq!(source.next().await.unwrap().latitude, 5.0);
        assert_eq!(source.next().await.unwrap().latitude, 7.0);
    }

    #[tokio::test]
    async fn test_revocation_ends_sequence() {
        let provider = ManualPositionProvider::default();
        let mut source = LocationSource::open(&provider, unthrottled()).unwrap();
        provider.push(LocationFix::new(1.0, 1.0));
        assert!(source.next().await.is_some());

        provider.set_permission(LocationPermission::Denied);
        provider.push(LocationFix::new(2.0, 2.0));

        assert!(source.next().await.is_none());

        // Granting again does not revive a finished source
        provider.set_permission(LocationPermission::Granted);
        provider.push(LocationFix::new(3.0, 3.0));
        assert!(source.next().await.is_none());
    }

    #[tokio::test]
    async fn test_revocation_ends_idle_sequence() {
        let provider = ManualPositionProvider::default();
        let mut source = LocationSource::open(&provider, unthrottled()).unwrap();

        let waiting = tokio::spawn(async move { source.next().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        provider.set_permission(LocationPermission::Denied);

        let result = tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("source should finish on revocation")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_finishes_when_provider_dropped() {
        let provider = ManualPositionProvider::default();
        let mut source = LocationSource::open(&provider, unthrottled()).unwrap();
        drop(provider);

        assert!(source.next().await.is_none());
        assert!(source.next().await.is_none());
    }
}
