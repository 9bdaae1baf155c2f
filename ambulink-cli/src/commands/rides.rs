//! Ride list and lifecycle commands.


use ambulink::realtime::{ConnectionState, RealtimeChannel};
use ambulink::rides::{Ride, RideBoard};
use tracing::info;

use super::location::{idle_provider, LocationArgs, LocationFeed};
use crate::error::CliError;
use crate::runner::{CliRunner, Coordinator};

/// Refresh and print pending and accepted rides.
pub async fn run_rides(runner: &CliRunner) -> Result<(), CliError> {
    let coordinator = runner.coordinator(idle_provider(runner.config()))?;
    coordinator.refresh_all().await?;
    print_board(&coordinator.board());
    Ok(())
}

/// Print completed rides.
pub async fn run_history(runner: &CliRunner) -> Result<(), CliError> {
    let coordinator = runner.coordinator(idle_provider(runner.config()))?;
    let rides = coordinator.ride_history().await?;

    if rides.is_empty() {
        println!("No completed rides");
        return Ok(());
    }
    println!("Completed Rides ({})", rides.len());
    println!("===============");
    for ride in &rides {
        print_ride(ride);
    }
    Ok(())
}

/// Accept a call and stream location until Ctrl-C.
pub async fn run_accept(
    runner: &CliRunner,
    call_id: &str,
    location: &LocationArgs,
) -> Result<(), CliError> {
    let feed = LocationFeed::start(location, runner.config());
    let coordinator = runner.coordinator(feed.provider())?;

    coordinator.accept(call_id).await?;
    println!("Accepted call {}", call_id);
    print_board(&coordinator.board());

    stream_until_interrupted(&coordinator).await;
    println!();
    println!("Tracking paused. The ride is still accepted.");
    println!("  Resume streaming: ambulink track");
    println!("  Finish the ride:  ambulink complete {}", call_id);
    Ok(())
}

/// Decline a call.
pub async fn run_decline(runner: &CliRunner, call_id: &str) -> Result<(), CliError> {
    let coordinator = runner.coordinator(idle_provider(runner.config()))?;
    let result = coordinator.decline(call_id).await;
    // Lists were refreshed either way
    print_board(&coordinator.board());
    result?;
    println!("Declined call {}", call_id);
    Ok(())
}

/// Complete the accepted ride.
pub async fn run_complete(runner: &CliRunner, call_id: &str) -> Result<(), CliError> {
    let coordinator = runner.coordinator(idle_provider(runner.config()))?;
    coordinator.complete(call_id).await?;
    println!("Completed ride {}", call_id);
    print_board(&coordinator.board());
    Ok(())
}

/// Ask the backend to text the patient.
pub async fn run_sms(runner: &CliRunner, ride_id: &str) -> Result<(), CliError> {
    let coordinator = runner.coordinator(idle_provider(runner.config()))?;
    coordinator.send_sms(ride_id).await?;
    println!("SMS sent for ride {}", ride_id);
    Ok(())
}

/// Resume streaming for the accepted ride until Ctrl-C.
pub async fn run_track(runner: &CliRunner, location: &LocationArgs) -> Result<(), CliError> {
    let feed = LocationFeed::start(location, runner.config());
    let coordinator = runner.coordinator(feed.provider())?;

    coordinator.resume_tracking().await?;
    println!("Streaming location for the accepted ride");

    stream_until_interrupted(&coordinator).await;
    println!();
    println!("Tracking stopped");
    Ok(())
}

async fn stream_until_interrupted(coordinator: &Coordinator) {
    println!("Press Ctrl-C to stop streaming");

    let mut last_state = ConnectionState::Disconnected;
    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(500));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                let state = coordinator.channel().state();
                if state != last_state {
                    println!("  Channel: {}", describe(state));
                    last_state = state;
                }
                if !coordinator.is_tracking() {
                    println!("  Location source ended");
                    break;
                }
            }
        }
    }
    info!("Streaming interrupted");
}

fn describe(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "disconnected",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Connected => "connected",
    }
}

fn print_board(board: &RideBoard) {
    if let Some(online) = board.online {
        println!("Status: {}", if online { "online" } else { "offline" });
    }

    println!();
    println!("Accepted ({})", board.accepted.len());
    for ride in &board.accepted {
        print_ride(ride);
    }

    println!();
    println!("Pending ({})", board.pending.len());
    for ride in &board.pending {
        print_ride(ride);
    }
}

fn print_ride(ride: &Ride) {
    println!("  {}  {}  {}", ride.id, ride.patient_name, ride.phone_number);
    if let Some(address) = &ride.address {
        println!("      {}", address);
    }
    if let Some((lat, lng)) = ride.coordinates() {
        println!("      {:.5}, {:.5}", lat, lng);
    }
    if !ride.created_at.is_empty() {
        println!("      created {}", ride.created_at);
    }
}

