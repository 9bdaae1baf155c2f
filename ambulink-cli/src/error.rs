//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use ambulink::api::ApiError;
use ambulink::config::ConfigFileError;
use ambulink::location::LocationError;
use ambulink::realtime::RealtimeError;
use ambulink::rides::DispatchError;
use ambulink::session::SessionError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to build a client component
    Setup(String),
    /// Invalid command input
    Input(String),
    /// A dispatch operation failed
    Dispatch(DispatchError),
    /// No GPS fix arrived in time
    NoFix { waited_secs: u64 },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Dispatch(DispatchError::NotLoggedIn) => {
                eprintln!();
                eprintln!("Log in first with: ambulink login --email <email>");
            }
            CliError::Dispatch(DispatchError::Location(LocationError::PermissionDenied)) => {
                eprintln!();
                eprintln!("Location access is disabled. Enable it with:");
                eprintln!("  ambulink config set location.access granted");
            }
            CliError::NoFix { .. } => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. GPS forwarder not sending to the configured UDP port (location.udp_port)");
                eprintln!("  2. Firewall blocking inbound UDP");
                eprintln!("  3. Use --at <lat,lng> to report a fixed position");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Setup(msg) => write!(f, "Failed to start client: {}", msg),
            CliError::Input(msg) => write!(f, "{}", msg),
            CliError::Dispatch(e) => write!(f, "{}", e),
            CliError::NoFix { waited_secs } => {
                write!(f, "No location fix received within {}s", waited_secs)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Dispatch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DispatchError> for CliError {
    fn from(e: DispatchError) -> Self {
        CliError::Dispatch(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Setup(e.to_string())
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        CliError::Setup(e.to_string())
    }
}

impl From<RealtimeError> for CliError {
    fn from(e: RealtimeError) -> Self {
        CliError::Setup(e.to_string())
    }
}
