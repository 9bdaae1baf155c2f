//! Partner account commands.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use clap::ValueEnum;

use super::location::{idle_provider, LocationArgs, LocationFeed};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Availability requested by `ambulink status`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Availability {
    Online,
    Offline,
}

/// Log in and cache the partner profile.
pub async fn run_login(
    runner: &CliRunner,
    email: &str,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password: ")?,
    };

    let coordinator = runner.coordinator(idle_provider(runner.config()))?;
    let partner = coordinator.login(email, &password).await?;

    println!("Logged in as {} ({})", partner.name, partner.email);
    if !partner.vehicle_number.is_empty() {
        println!("  Vehicle: {}", partner.vehicle_number);
    }
    println!("  Status:  {}", if partner.is_online { "online" } else { "offline" });
    Ok(())
}

/// Stop tracking and wipe the local session.
pub async fn run_logout(runner: &CliRunner) -> Result<(), CliError> {
    let coordinator = runner.coordinator(idle_provider(runner.config()))?;
    coordinator.logout().await?;
    println!("Logged out");
    Ok(())
}

/// Fetch and print the partner profile.
pub async fn run_profile(runner: &CliRunner) -> Result<(), CliError> {
    let coordinator = runner.coordinator(idle_provider(runner.config()))?;
    let partner = coordinator.load_profile().await?;

    println!("Partner Profile");
    println!("===============");
    println!();
    println!("  Name:    {}", partner.name);
    println!("  Phone:   {}", partner.phone_number);
    println!("  Email:   {}", partner.email);
    println!("  Vehicle: {}", partner.vehicle_number);
    println!("  Status:  {}", if partner.is_online { "online" } else { "offline" });
    if let Some(ride) = coordinator.board().active_ride() {
        println!();
        println!("  Active ride: {} ({})", ride.id, ride.patient_name);
    }
    Ok(())
}

/// Change the partner password.
pub async fn run_password(
    runner: &CliRunner,
    old_password: Option<String>,
    new_password: Option<String>,
) -> Result<(), CliError> {
    let old_password = match old_password {
        Some(p) => p,
        None => prompt("Current password: ")?,
    };
    let new_password = match new_password {
        Some(p) => p,
        None => prompt("New password: ")?,
    };
    if new_password.is_empty() {
        return Err(CliError::Input("New password must not be empty".to_string()));
    }

    let coordinator = runner.coordinator(idle_provider(runner.config()))?;
    let message = coordinator
        .change_password(&old_password, &new_password)
        .await?;
    println!("{}", message.unwrap_or_else(|| "Password changed".to_string()));
    Ok(())
}

/// Toggle online/offline, reporting the current position.
pub async fn run_status(
    runner: &CliRunner,
    availability: Availability,
    location: &LocationArgs,
    wait_secs: u64,
) -> Result<(), CliError> {
    let feed = LocationFeed::start(location, runner.config());
    let fix = feed.wait_for_fix(Duration::from_secs(wait_secs)).await?;

    let coordinator = runner.coordinator(feed.provider())?;
    let online = matches!(availability, Availability::Online);
    coordinator.update_status(online).await?;

    println!(
        "Now {} at {:.5}, {:.5}",
        if online { "online" } else { "offline" },
        fix.latitude,
        fix.longitude
    );
    Ok(())
}


fn prompt(label: &str) -> Result<String, CliError> {
    print!("{}", label);
    io::stdout()
        .flush()
        .map_err(|e| CliError::Input(e.to_string()))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| CliError::Input(e.to_string()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
