//! Position providers.
//!
//! A provider is the device side of location: it knows whether access is
//! permitted, remembers the last fix it saw and publishes every new fix.
//! Permission changes are observable so running sources stop on revocation.

use std::sync::{Arc, RwLock};

use tokio::sync::{broadcast, watch};
use tracing::{debug, trace};

use super::fix::LocationFix;
use super::permission::LocationPermission;

/// Capacity of the raw fix broadcast channel.
const FIX_CHANNEL_CAPACITY: usize = 64;

/// Source of raw device fixes.
pub trait PositionProvider: Send + Sync + 'static {
    /// Current location permission.
    fn permission(&self) -> LocationPermission {
        *self.watch_permission().borrow()
    }

    /// Receiver notified whenever the permission changes.
    fn watch_permission(&self) -> watch::Receiver<LocationPermission>;

    /// Subscribe to raw fixes published from now on.
    fn subscribe(&self) -> broadcast::Receiver<LocationFix>;

    /// Most recent fix, if any has been observed.
    fn last_known(&self) -> Option<LocationFix>;
}

impl<P: PositionProvider + ?Sized> PositionProvider for Arc<P> {
    fn permission(&self) -> LocationPermission {
        (**self).permission()
    }

    fn watch_permission(&self) -> watch::Receiver<LocationPermission> {
        (**self).watch_permission()
    }

    fn subscribe(&self) -> broadcast::Receiver<LocationFix> {
        (**self).subscribe()
    }

    fn last_known(&self) -> Option<LocationFix> {
        (**self).last_known()
    }
}

/// Shared state behind every provider: permission, last fix, fan-out.
#[derive(Debug)]
pub(crate) struct FixHub {
    permission: watch::Sender<LocationPermission>,
    last: RwLock<Option<LocationFix>>,
    tx: broadcast::Sender<LocationFix>,
}

impl FixHub {
    pub(crate) fn new(permission: LocationPermission) -> Self {
        let (tx, _) = broadcast::channel(FIX_CHANNEL_CAPACITY);
        let (permission, _) = watch::channel(permission);
        Self {
            permission,
            last: RwLock::new(None),
            tx,
        }
    }

    pub(crate) fn publish(&self, fix: LocationFix) {
        *self.last.write().unwrap() = Some(fix);
        // No subscribers is normal while nothing is tracking
        if let Err(e) = self.tx.send(fix) {
            trace!(error = %e, "No fix subscribers");
        }
    }

    pub(crate) fn permission(&self) -> LocationPermission {
        *self.permission.borrow()
    }

    pub(crate) fn set_permission(&self, permission: LocationPermission) {
        let previous = self.permission.send_replace(permission);
        if previous != permission {
            debug!(%permission, "Location permission changed");
        }
    }

    pub(crate) fn watch_permission(&self) -> watch::Receiver<LocationPermission> {
        self.permission.subscribe()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LocationFix> {
        self.tx.subscribe()
    }

    pub(crate) fn last_known(&self) -> Option<LocationFix> {
        *self.last.read().unwrap()
    }
}

/// Provider fed by the caller.
///
/// Used by the `--at` and `--stdin` CLI modes and by tests.
#[derive(Debug)]
pub struct ManualPositionProvider {
    hub: FixHub,
}

impl ManualPositionProvider {
    pub fn new(permission: LocationPermission) -> Self {
        Self {
            hub: FixHub::new(permission),
        }
    }

    /// Publish a fix to every subscriber.
    pub fn push(&self, fix: LocationFix) {
        self.hub.publish(fix);
    }

    pub fn set_permission(&self, permission: LocationPermission) {
        self.hub.set_permission(permission);
    }
}

impl Default for ManualPositionProvider {
    fn default() -> Self {
        Self::new(LocationPermission::Granted)
    }
}

impl PositionProvider for ManualPositionProvider {
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
