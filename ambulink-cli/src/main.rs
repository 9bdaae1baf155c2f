//! AmbuLink CLI - Command-line interface
//!
//! This binary drives the AmbuLink library: it triggers dispatch operations
//! and prints the resulting notices.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::account::{self, Availability};
use commands::config::{self, ConfigCommands};
use commands::location::LocationArgs;
use commands::rides;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "ambulink")]
#[command(version = ambulink::VERSION)]
#[command(about = "Ambulance partner dispatch client", long_about = None)]
struct Cli {
    /// Enable debug-level logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    /// Also print log lines to stdout
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as an ambulance partner
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Stop tracking and forget the local session
    Logout,

    /// Show the partner profile
    Profile,

    /// Change the account password
    Password {
        /// Current password (prompted when omitted)
        #[arg(long)]
        old: Option<String>,

        /// New password (prompted when omitted)
        #[arg(long)]
        new: Option<String>,
    },

    /// Go online or offline
    Status {
        #[arg(value_enum)]
        availability: Availability,

        #[command(flatten)]
        location: LocationArgs,

        /// Seconds to wait for a GPS fix
        #[arg(long, default_value = "15")]
        wait: u64,
    },

    /// List pending and accepted rides
    Rides,

    /// List completed rides
    History,

    /// Accept a pending call and stream location until Ctrl-C
    Accept {
        /// Call (ride) id
        call_id: String,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Decline a pending call
    Decline {
        /// Call (ride) id
        call_id: String,
    },

    /// Complete the accepted ride
    Complete {
        /// Call (ride) id
        call_id: String,
    },

    /// Ask the backend to text the patient
    Sms {
        /// Ride id
        ride_id: String,
    },

    /// Resume streaming location for the accepted ride until Ctrl-C
    Track {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Logout => "logout",
            Commands::Profile => "profile",
            Commands::Password { .. } => "password",
            Commands::Status { .. } => "status",
            Commands::Rides => "rides",
            Commands::History => "history",
            Commands::Accept { .. } => "accept",
            Commands::Decline { .. } => "decline",
            Commands::Complete { .. } => "complete",
            Commands::Sms { .. } => "sms",
            Commands::Track { .. } => "track",
            Commands::Config(_) => "config",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        e.exit();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // Config commands work without logging so a broken log path can be fixed
    let command = match cli.command {
        Commands::Config(command) => return config::run(command),
        command => command,
    };

    let runner = CliRunner::new(cli.debug, cli.verbose)?;
    runner.log_startup(command.name());

    match command {
        Commands::Login { email, password } => account::run_login(&runner, &email, password).await,
        Commands::Logout => account::run_logout(&runner).await,
        Commands::Profile => account::run_profile(&runner).await,
        Commands::Password { old, new } => account::run_password(&runner, old, new).await,
        Commands::Status {
            availability,
            location,
            wait,
        } => account::run_status(&runner, availability, &location, wait).await,
        Commands::Rides => rides::run_rides(&runner).await,
        Commands::History => rides::run_history(&runner).await,
        Commands::Accept { call_id, location } => {
            rides::run_accept(&runner, &call_id, &location).await
        }
        Commands::Decline { call_id } => rides::run_decline(&runner, &call_id).await,
        Commands::Complete { call_id } => rides::run_complete(&runner, &call_id).await,
        Commands::Sms { ride_id } => rides::run_sms(&runner, &ride_id).await,
        Commands::Track { location } => rides::run_track(&runner, &location).await,
        Commands::Config(command) => config::run(command),
    }
}
