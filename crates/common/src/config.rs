use std::str::FromStr;

use chrono::Duration;

use crate::{Error, Result};

/// Runtime configuration loaded from environment variables at startup.
/// Every variable is optional; a present but malformed value is an error.
#[derive(Debug, Clone)]
pub struct Config {
    // Market data
    pub binance_base_url: String,

    // Markets file path
    pub markets_config_path: String,

    // Cache
    pub candle_cache_ttl_secs: u64,
    pub analysis_cache_ttl_secs: u64,

    /// `None` = analyze once and exit.
    pub refresh_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            binance_base_url: "https://api.binance.com".to_string(),
            markets_config_path: "config/markets.toml".to_string(),
            candle_cache_ttl_secs: 3600,
            analysis_cache_ttl_secs: 1800,
            refresh_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let refresh_secs = parse_optional(&lookup, "REFRESH_SECS")?;
        if refresh_secs == Some(0) {
            return Err(Error::Config("REFRESH_SECS must be greater than zero".into()));
        }

        Ok(Config {
            binance_base_url: lookup("BINANCE_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.binance_base_url),
            markets_config_path: lookup("MARKETS_CONFIG_PATH")
                .unwrap_or(defaults.markets_config_path),
            candle_cache_ttl_secs: parse_ttl(&lookup, "CANDLE_CACHE_TTL_SECS")?
                .unwrap_or(defaults.candle_cache_ttl_secs),
            analysis_cache_ttl_secs: parse_ttl(&lookup, "ANALYSIS_CACHE_TTL_SECS")?
                .unwrap_or(defaults.analysis_cache_ttl_secs),
            refresh_secs,
        })
    }

    pub fn candle_cache_ttl(&self) -> Result<Duration> {
        ttl_duration("CANDLE_CACHE_TTL_SECS", self.candle_cache_ttl_secs)
    }

    pub fn analysis_cache_ttl(&self) -> Result<Duration> {
        ttl_duration("ANALYSIS_CACHE_TTL_SECS", self.analysis_cache_ttl_secs)
    }
}

/// A TTL must fit a `chrono::Duration`; anything larger would overflow the
/// cache's expiry arithmetic.
fn ttl_duration(key: &str, secs: u64) -> Result<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| Error::Config(format!("{key} is out of range: {secs}")))
}

fn parse_ttl<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_optional::<F, u64>(lookup, key)?;
    if let Some(secs) = secs {
        ttl_duration(key, secs)?;
    }
    Ok(secs)
}

fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            Error::Config(format!("{key} has an invalid value: '{raw}'"))
        }),
    }
}
