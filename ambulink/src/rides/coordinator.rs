//! Ride coordinator.

use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::board::{Ride, RideBoard, RideStatus};
use super::error::DispatchError;
use crate::api::{ApiError, DispatchApi, PartnerProfile, RideQuery, StatusUpdate};
use crate::location::{LocationSource, PositionProvider, SamplingPolicy};
use crate::realtime::RealtimeChannel;
use crate::session::{keys, SessionStore};
use crate::tracking::{TrackingHandle, TrackingService};

/// Capacity of the board snapshot broadcast channel.
const BOARD_CHANNEL_CAPACITY: usize = 16;

/// Coordinates the partner's ride lifecycle.
///
/// Holds the REST client, session store, realtime channel and position
/// provider, and owns the single tracking runner. Board state sits behind
/// an `RwLock`; every change is broadcast to subscribers as a full snapshot.
///
/// Operations do not lock against each other. The backend is trusted to
/// reject invalid transitions.
pub struct RideCoordinator<A, S, C, P>
where
    A: DispatchApi,
    S: SessionStore + ?Sized,
    C: RealtimeChannel + ?Sized,
    P: PositionProvider + ?Sized,
{
    api: Arc<A>,
    session: Arc<S>,
    channel: Arc<C>,
    provider: Arc<P>,
    policy: SamplingPolicy,
    board: RwLock<RideBoard>,
    updates: broadcast::Sender<RideBoard>,
    tracker: Mutex<Option<TrackingHandle>>,
}

impl<A, S, C, P> RideCoordinator<A, S, C, P>
where
    A: DispatchApi,
    S: SessionStore + ?Sized,
    C: RealtimeChannel + ?Sized,
    P: PositionProvider + ?Sized,
{
    pub fn new(
        api: Arc<A>,
        session: Arc<S>,
        channel: Arc<C>,
        provider: Arc<P>,
        policy: SamplingPolicy,
    ) -> Self {
        let (updates, _) = broadcast::channel(BOARD_CHANNEL_CAPACITY);
        Self {
            api,
            session,
            channel,
            provider,
            policy,
            board: RwLock::new(RideBoard::default()),
            updates,
            tracker: Mutex::new(None),
        }
    }

    /// Current board snapshot.
    pub fn board(&self) -> RideBoard {
        self.board.read().unwrap().clone()
    }

    /// Subscribe to board snapshots published after every change.
    pub fn subscribe(&self) -> broadcast::Receiver<RideBoard> {
        self.updates.subscribe()
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Whether a tracking runner is alive.
    pub fn is_tracking(&self) -> bool {
        self.tracker
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(TrackingHandle::is_running)
    }

    // ─── Ride lists ──────────────────────────────────────────────────────

    /// Fetch the global pending queue and replace the local pending list.
    pub async fn fetch_pending(&self) -> Result<Vec<Ride>, DispatchError> {
        let response = self.api.pending_rides().await?;
        let pending: Vec<Ride> = response.ride.into_iter().map(Ride::from_pending).collect();
        debug!(count = pending.len(), "Pending rides fetched");

        let snapshot = pending.clone();
        self.update_board(|board| board.pending = snapshot);
        Ok(pending)
    }

    /// Fetch the partner's active rides and replace the accepted list.
    ///
    /// A non-empty accepted list clears pending; an empty one triggers a
    /// pending re-fetch.
    pub async fn fetch_active(&self, partner_id: &str) -> Result<Vec<Ride>, DispatchError> {
        let response = self.api.partner_rides(partner_id, RideQuery::Active).await?;
        let accepted: Vec<Ride> = response
            .ride
            .into_iter()
            .map(|item| Ride::from_partner(item, RideStatus::Accepted))
            .collect();
        debug!(count = accepted.len(), "Active rides fetched");

        if accepted.is_empty() {
            self.update_board(|board| board.accepted.clear());
            self.fetch_pending().await?;
        } else {
            let snapshot = accepted.clone();
            self.update_board(|board| {
                board.accepted = snapshot;
                board.pending.clear();
            });
        }
        Ok(accepted)
    }

    /// Fetch pending, then active.
    pub async fn refresh_all(&self) -> Result<(), DispatchError> {
        let partner_id = self.partner_id()?;
        self.fetch_pending().await?;
        self.fetch_active(&partner_id).await?;
        Ok(())
    }

    /// Completed rides of the partner. Not kept on the board.
    pub async fn ride_history(&self) -> Result<Vec<Ride>, DispatchError> {
        let partner_id = self.partner_id()?;
        let response = self.api.partner_rides(&partner_id, RideQuery::Complete).await?;
        Ok(response
            .ride
            .into_iter()
            .map(|item| Ride::from_partner(item, RideStatus::Complete))
            .collect())
    }

    // ─── Lifecycle transitions ───────────────────────────────────────────

    /// Accept a pending call.
    ///
    /// On success the session key is persisted, the channel is connecting,
    /// tracking is running and both lists are refreshed. On any failure
    /// before that point no local state changes. Returns the session key.
    pub async fn accept(&self, call_id: &str) -> Result<String, DispatchError> {
        let partner_id = self.partner_id()?;
        let source = LocationSource::open(&*self.provider, self.policy)?;

        let response = self.api.accept_ride(call_id, &partner_id).await?;
        let session_key = response
            .session_key()
            .map(str::to_string)
            .ok_or(DispatchError::MissingSessionKey)?;

        let previous_key = self.session.session_key();
        self.session.set(keys::SESSION_KEY, &session_key)?;

        if let Err(e) = self.channel.connect() {
            self.restore_session_key(previous_key.as_deref());
            return Err(e.into());
        }

        self.replace_tracker(source, &partner_id, &session_key).await;
        info!(call_id, partner_id = %partner_id, "Call accepted");

        self.refresh_after("accept").await;
        Ok(session_key)
    }

    /// Decline a call. Lists are refreshed whatever the outcome.
    pub async fn decline(&self, call_id: &str) -> Result<(), DispatchError> {
        let result = self.api.decline_ride(call_id).await;
        match &result {
            Ok(()) => info!(call_id, "Call declined"),
            Err(e) => warn!(call_id, error = %e, "Decline failed"),
        }

        self.refresh_after("decline").await;
        result.map_err(DispatchError::from)
    }

    /// Complete the accepted ride.
    ///
    /// Clears the session key, stops tracking, closes the channel and
    /// refreshes both lists.
    pub async fn complete(&self, call_id: &str) -> Result<(), DispatchError> {
        let partner_id = self.partner_id()?;
        self.api.complete_ride(call_id, &partner_id).await?;

        // The ride is over server-side, so tracking ends even if the key stays
        let cleared = self.session.remove(keys::SESSION_KEY);
        self.stop_tracking().await;
        self.channel.disconnect();
        info!(call_id, "Ride completed");

        self.refresh_after("complete").await;
        cleared.map_err(DispatchError::from)
    }

    /// Restart tracking from a persisted session key.
    ///
    /// Used after a process restart while a ride is still accepted.
    pub async fn resume_tracking(&self) -> Result<String, DispatchError> {
        let partner_id = self.partner_id()?;
        let session_key = self
            .session
            .session_key()
            .ok_or(DispatchError::NoActiveSession)?;

        let already_running = self
            .tracker
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|t| t.is_running() && t.session_key() == Some(session_key.as_str()));
        if already_running {
            self.channel.connect()?;
            return Ok(session_key);
        }

        let source = LocationSource::open(&*self.provider, self.policy)?;
        self.channel.connect()?;
        self.replace_tracker(source, &partner_id, &session_key).await;
        info!(partner_id = %partner_id, "Tracking resumed");
        Ok(session_key)
    }

    // ─── Partner ─────────────────────────────────────────────────────────

    /// Log in and cache the partner identity and profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<PartnerProfile, DispatchError> {
        let response = self.api.login(email, password).await?;
        let partner = match response.partner.clone() {
            Some(partner) if !partner.id.is_empty() => partner,
            _ => {
                let reason = response.reason().unwrap_or("no partner in response");
                return Err(DispatchError::LoginRejected(reason.to_string()));
            }
        };

        self.session.set(keys::USER_ID, &partner.id)?;
        self.cache_profile(&partner)?;
        self.update_board(|board| board.online = Some(partner.is_online));
        info!(partner_id = %partner.id, "Logged in");
        Ok(partner)
    }

    /// Fetch the profile, cache it, record the online flag and refresh the
    /// accepted list.
    pub async fn load_profile(&self) -> Result<PartnerProfile, DispatchError> {
        let partner_id = self.partner_id()?;
        let partner = self
            .api
            .get_partner(&partner_id)
            .await?
            .partner
            .ok_or_else(|| ApiError::Decode("response has no partner".to_string()))?;

        self.session.set(keys::USER_ID_ALIAS, &partner_id)?;
        self.cache_profile(&partner)?;
        self.update_board(|board| board.online = Some(partner.is_online));

        if let Err(e) = self.fetch_active(&partner_id).await {
            warn!(error = %e, "Active ride refresh after profile load failed");
        }
        Ok(partner)
    }

    /// Stop tracking, disconnect and wipe the session.
    pub async fn logout(&self) -> Result<(), DispatchError> {
        self.stop_tracking().await;
        self.channel.disconnect();
        self.session.clear()?;
        self.update_board(|board| *board = RideBoard::default());
        info!("Logged out");
        Ok(())
    }

    /// Toggle availability, reporting the last known position.
    pub async fn update_status(&self, online: bool) -> Result<(), DispatchError> {
        let fix = self
            .provider
            .last_known()
            .ok_or(DispatchError::NoLocationFix)?;
        let partner_id = self.partner_id()?;

        let update = StatusUpdate {
            is_online: online,
            lat: fix.latitude,
            lng: fix.longitude,
        };
        self.api.change_status(&partner_id, &update).await?;

        self.update_board(|board| board.online = Some(online));
        info!(online, "Status updated");
        Ok(())
    }

    /// Change the partner password. Returns the server message, if any.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Option<String>, DispatchError> {
        let partner_id = self.partner_id()?;
        let response = self
            .api
            .change_password(&partner_id, old_password, new_password)
            .await?;
        Ok(response.message)
    }

    /// Ask the backend to text the patient of a ride.
    pub async fn send_sms(&self, ride_id: &str) -> Result<(), DispatchError> {
        self.api.send_sms(ride_id).await?;
        debug!(ride_id, "SMS requested");
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn partner_id(&self) -> Result<String, DispatchError> {
        self.session.partner_id().ok_or(DispatchError::NotLoggedIn)
    }

    fn cache_profile(&self, partner: &PartnerProfile) -> Result<(), DispatchError> {
        self.session.set(keys::NAME, &partner.name)?;
        self.session.set(keys::PHONE, &partner.phone_number)?;
        self.session.set(keys::EMAIL, &partner.email)?;
        self.session.set(keys::PHOTO_URL, &partner.image_url)?;
        Ok(())
    }

    fn restore_session_key(&self, previous: Option<&str>) {
        let result = match previous {
            Some(key) => self.session.set(keys::SESSION_KEY, key),
            None => self.session.remove(keys::SESSION_KEY),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to restore session key");
        }
    }

    async fn replace_tracker(&self, source: LocationSource, partner_id: &str, session_key: &str) {
        self.stop_tracking().await;
        let handle = TrackingService::start(
            Arc::clone(&self.channel),
            source,
            partner_id.to_string(),
            Some(session_key.to_string()),
        );
        *self.tracker.lock().unwrap() = Some(handle);
    }

    async fn stop_tracking(&self) {
        let handle = self.tracker.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }

    async fn refresh_after(&self, operation: &str) {
        if let Err(e) = self.refresh_all().await {
            warn!(operation, error = %e, "Refresh after transition failed");
        }
    }

    fn update_board<F>(&self, change: F)
    where
        F: FnOnce(&mut RideBoard),
    {
        let snapshot = {
            let mut board = self.board.write().unwrap();
            change(&mut board);
            board.clone()
        };
        // No subscribers is fine
        let _ = self.updates.send(snapshot);
    }
}
