use crate::constants;
use crate::error::{Result, ScoutError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One ascending value band used to classify result events into tiers.
///
/// Bands are configuration, not code: the classifier only requires that
/// floors are totally ordered. Values below the lowest floor are not
/// dispatch-worthy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    /// Inclusive lower bound of the band.
    pub floor: f64,
    /// Label used for counters and sink routing, e.g. `"50-100M"`.
    pub label: String,
}

impl TierBand {
    pub fn new(floor: f64, label: impl Into<String>) -> Self {
        Self {
            floor,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoutConfig {
    /// Cooldown before an invalidated unit becomes claimable again.
    pub invalid_cooldown: Duration,
    /// Window for counting recently-active reporting clients.
    pub activity_window: Duration,
    /// Interval between periodic status dispatches.
    pub status_interval: Duration,
    /// Optional TTL after which a stuck Assigned lease is reclaimed to
    /// Pending. `None` preserves the observed behavior: leases are only
    /// released by an explicit release, invalidation, or scan.
    pub lease_ttl: Option<Duration>,
    /// Depth of the bounded dispatch queue.
    pub dispatch_queue_depth: usize,
    /// Timeout for outbound sink calls.
    pub sink_timeout: Duration,
    /// Where the durable snapshot lives, if file persistence is used.
    pub snapshot_path: Option<PathBuf>,
    /// Ascending value bands for tier classification.
    pub tier_bands: Vec<TierBand>,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            invalid_cooldown: constants::DEFAULT_INVALID_COOLDOWN,
            activity_window: constants::DEFAULT_ACTIVITY_WINDOW,
            status_interval: constants::DEFAULT_STATUS_INTERVAL,
            lease_ttl: None,
            dispatch_queue_depth: constants::DEFAULT_DISPATCH_QUEUE_DEPTH,
            sink_timeout: constants::DEFAULT_SINK_TIMEOUT,
            snapshot_path: None,
            tier_bands: default_tier_bands(),
        }
    }
}

/// Default bands matching the deployed webhook categories.
pub fn default_tier_bands() -> Vec<TierBand> {
    vec![
        TierBand::new(1_000_000.0, "1-10M"),
        TierBand::new(10_000_000.0, "10-50M"),
        TierBand::new(50_000_000.0, "50-100M"),
        TierBand::new(100_000_000.0, "100-500M"),
        TierBand::new(500_000_000.0, "500M-1B"),
        TierBand::new(1_000_000_000.0, "1B+"),
    ]
}

impl ScoutConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(secs) = std::env::var("SCOUT_INVALID_COOLDOWN_SECS") {
            config.invalid_cooldown = Duration::from_secs(parse_var("SCOUT_INVALID_COOLDOWN_SECS", &secs)?);
        }

        if let Ok(secs) = std::env::var("SCOUT_ACTIVITY_WINDOW_SECS") {
            config.activity_window = Duration::from_secs(parse_var("SCOUT_ACTIVITY_WINDOW_SECS", &secs)?);
        }

        if let Ok(secs) = std::env::var("SCOUT_STATUS_INTERVAL_SECS") {
            config.status_interval = Duration::from_secs(parse_var("SCOUT_STATUS_INTERVAL_SECS", &secs)?);
        }

        if let Ok(secs) = std::env::var("SCOUT_LEASE_TTL_SECS") {
            config.lease_ttl = Some(Duration::from_secs(parse_var("SCOUT_LEASE_TTL_SECS", &secs)?));
        }

        if let Ok(depth) = std::env::var("SCOUT_DISPATCH_QUEUE_DEPTH") {
            config.dispatch_queue_depth = parse_var("SCOUT_DISPATCH_QUEUE_DEPTH", &depth)?;
        }

        if let Ok(secs) = std::env::var("SCOUT_SINK_TIMEOUT_SECS") {
            config.sink_timeout = Duration::from_secs(parse_var("SCOUT_SINK_TIMEOUT_SECS", &secs)?);
        }

        if let Ok(path) = std::env::var("SCOUT_SNAPSHOT_PATH") {
            config.snapshot_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ScoutError::ConfigurationError(format!("Invalid {name}: {e}")))
}
