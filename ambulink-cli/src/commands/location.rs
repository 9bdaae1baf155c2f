//! Position provider selection for commands that need the device location.

use std::sync::Arc;
use std::time::Duration;

use ambulink::config::ConfigFile;
use ambulink::location::{
    LocationFix, ManualPositionProvider, PositionProvider, UdpPositionProvider,
    UdpReceiverConfig,
};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CliError;

/// Floor for the `--at` re-publish period.
const MIN_REPEAT_PERIOD: Duration = Duration::from_millis(500);

/// Where location fixes come from.
#[derive(Debug, Clone, Args)]
pub struct LocationArgs {
    /// Report a fixed position instead of listening for GPS (format: lat,lng)
    #[arg(long, value_parser = parse_position, conflicts_with = "stdin")]
    pub at: Option<(f64, f64)>,

    /// Read fixes as "lat,lng" lines from stdin instead of listening for GPS
    #[arg(long)]
    pub stdin: bool,
}

/// A running position provider and whatever feeds it.
pub struct LocationFeed {
    provider: Arc<dyn PositionProvider>,
    shutdown: CancellationToken,
}

impl LocationFeed {
    /// Start the provider selected by `args`.
    ///
    /// The permission reported by every provider comes from
    /// `location.access` in the config.
    pub fn start(args: &LocationArgs, config: &ConfigFile) -> Self {
        let shutdown = CancellationToken::new();
        let access = config.location.access;

        let provider: Arc<dyn PositionProvider> = if let Some((lat, lng)) = args.at {
            let manual = Arc::new(ManualPositionProvider::new(access));
            let fix = LocationFix::new(lat, lng);
            manual.push(fix);
            let period = config.location.sampling_policy().interval.max(MIN_REPEAT_PERIOD);
            tokio::spawn(repeat_fixed_position(
                Arc::clone(&manual),
                fix,
                period,
                shutdown.clone(),
            ));
            manual
        } else if args.stdin {
            let manual = Arc::new(ManualPositionProvider::new(access));
            tokio::spawn(read_stdin_fixes(Arc::clone(&manual), shutdown.clone()));
            manual
        } else {
            let udp = UdpPositionProvider::new(UdpReceiverConfig {
                port: config.location.udp_port,
                access,
                ..Default::default()
            });
            let handle = udp.start(shutdown.clone());
            tokio::spawn(async move {
                if let Ok(Err(e)) = handle.await {
                    warn!(error = %e, "GPS receiver exited");
                }
            });
            Arc::new(udp)
        };

        Self { provider, shutdown }
    }

    pub fn provider(&self) -> Arc<dyn PositionProvider> {
        Arc::clone(&self.provider)
    }

    /// Wait until the provider has a last known fix.
    pub async fn wait_for_fix(&self, timeout: Duration) -> Result<LocationFix, CliError> {
        let mut rx = self.provider.subscribe();
        if let Some(fix) = self.provider.last_known() {
            return Ok(fix);
        }
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Ok(fix)) => Ok(fix),
            _ => Err(CliError::NoFix {
                waited_secs: timeout.as_secs(),
            }),
        }
    }
}

impl Drop for LocationFeed {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Re-publish `fix` every `period` so a stationary unit keeps reporting.
async fn repeat_fixed_position(
    provider: Arc<ManualPositionProvider>,
    fix: LocationFix,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => provider.push(LocationFix::new(fix.latitude, fix.longitude)),
        }
    }
}

async fn read_stdin_fixes(provider: Arc<ManualPositionProvider>, shutdown: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => match parse_position(line.trim()) {
                Ok((lat, lng)) => provider.push(LocationFix::new(lat, lng)),
                Err(e) => warn!(input = %line, "Ignoring stdin line: {}", e),
            },
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
}

/// Provider for commands that never read the location.
pub fn idle_provider(config: &ConfigFile) -> Arc<dyn PositionProvider> {
    Arc::new(ManualPositionProvider::new(config.location.access))
}

/// Parse "lat,lng".
pub fn parse_position(value: &str) -> Result<(f64, f64), String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lng', got '{}'", value))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("position out of range: {},{}", lat, lng));
    }
    Ok((lat, lng))
}

#[cfg(test)]
mod tests {
    use ambulink::location::{LocationSource, SamplingPolicy};

    use super::*;

    #[tokio::test]
    async fn test_fixed_position_keeps_streaming() {
        let provider = Arc::new(ManualPositionProvider::default());
        let shutdown = CancellationToken::new();
        provider.push(LocationFix::new(28.6, 77.2));

        let mut source =
            LocationSource::open(&*provider, SamplingPolicy::new(Duration::ZERO, None)).unwrap();
        tokio::spawn(repeat_fixed_position(
            Arc::clone(&provider),
            LocationFix::new(28.6, 77.2),
            Duration::from_millis(10),
            shutdown.clone(),
        ));

        for _ in 0..3 {
            let fix = tokio::time::timeout(Duration::from_secs(1), source.next())
                .await
                .expect("fixed position should repeat")
                .unwrap();
            assert_eq!((fix.latitude, fix.longitude), (28.6, 77.2));
        }
        shutdown.cancel();
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("28.6139, 77.209").unwrap(), (28.6139, 77.209));
        assert!(parse_position("28.6").is_err());
        assert!(parse_position("north,east").is_err());
        assert!(parse_position("95,0").is_err());
    }
}
