use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::fragment_cache::FEATURED_TTL;

/// Simulated address donations are sent to.
pub const DONATION_ADDRESS: &str = "Bagz8tdTAjKJDUwM5cHhJt2SzD7siQUPb7U9mNhFwHxW";

/// Longest accepted featured fragment TTL.
pub const MAX_FEATURED_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Simulated confirmation wait before a donation is processed.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Featured fragment time-to-live and background refresh period.
    pub featured_ttl: Duration,
    pub settle_delay: Duration,
    pub donation_address: String,
    /// Directory holding the featured-fragment snapshot; `None` keeps it in memory.
    pub state_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            featured_ttl: FEATURED_TTL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            donation_address: DONATION_ADDRESS.to_string(),
            state_dir: None,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `SOLALM_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("SOLALM_FEATURED_TTL_SECS") {
            config.featured_ttl = parse_ttl("SOLALM_FEATURED_TTL_SECS", &raw)?;
        }
        if let Some(ms) = parse_env_u64("SOLALM_SETTLE_DELAY_MS")? {
            config.settle_delay = Duration::from_millis(ms);
        }
        if let Ok(address) = std::env::var("SOLALM_DONATION_ADDRESS") {
            if !address.trim().is_empty() {
                config.donation_address = address.trim().to_string();
            }
        }
        if let Some(dir) = std::env::var_os("SOLALM_STATE_DIR") {
            config.state_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }
}

fn parse_env_u64(var: &'static str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => parse_u64(var, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_ttl(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let ttl = Duration::from_secs(parse_u64(var, raw)?);
    if ttl.is_zero() || ttl > MAX_FEATURED_TTL {
        return Err(ConfigError::InvalidVar {
            var,
            value: raw.to_string(),
            reason: format!(
                "must be between 1 and {} seconds",
                MAX_FEATURED_TTL.as_secs()
            ),
        });
    }
    Ok(ttl)
}

fn parse_u64(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidVar {
            var,
            value: raw.to_string(),
            reason: err.to_string(),
        })
}
