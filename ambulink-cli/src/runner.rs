//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and construction of
//! the ride coordinator so command handlers stay small.

use std::sync::Arc;

use ambulink::api::HttpDispatchApi;
use ambulink::config::ConfigFile;
use ambulink::location::PositionProvider;
use ambulink::logging::{init_logging, LoggingGuard};
use ambulink::realtime::SocketChannel;
use ambulink::rides::RideCoordinator;
use ambulink::session::FileSessionStore;
use tracing::info;

use crate::error::CliError;

/// Coordinator type used by every CLI command.
pub type Coordinator =
    RideCoordinator<HttpDispatchApi, FileSessionStore, SocketChannel, dyn PositionProvider>;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    /// * `verbose` - When true, log lines are also printed to stdout
    pub fn new(debug_mode: bool, verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.file, verbose, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("AmbuLink v{}", ambulink::VERSION);
        info!(server = %self.config.server.base_url, "AmbuLink CLI: {} command", command);
    }

    /// Build the ride coordinator around a position provider.
    pub fn coordinator(&self, provider: Arc<dyn PositionProvider>) -> Result<Coordinator, CliError> {
        let api = HttpDispatchApi::new(&self.config.server)?;
        let session = FileSessionStore::open(self.config.session.file.clone())?;

        let channel_address = self
            .config
            .realtime
            .url
            .as_deref()
            .unwrap_or(&self.config.server.base_url);
        let channel = SocketChannel::new(channel_address)?;

        Ok(RideCoordinator::new(
            Arc::new(api),
            Arc::new(session),
            Arc::new(channel),
            provider,
            self.config.location.sampling_policy(),
        ))
    }
}
