use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use common::{CandleRequest, Error, Interval, Result};

/// Top-level markets file (TOML).
///
/// Example `config/markets.toml`:
/// ```toml
/// [[market]]
/// symbol = "BTCUSDT"
/// interval = "1w"
/// start = "2019-01-01"
/// display_limit = 100
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketFileConfig {
    #[serde(rename = "market")]
    pub markets: Vec<MarketConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketConfig {
    /// Trading pair, e.g. "BTCUSDT".
    pub symbol: String,
    #[serde(default = "default_interval")]
    pub interval: Interval,
    /// First day of history to fetch.
    #[serde(default = "default_start")]
    pub start: NaiveDate,
    /// Last day of history to fetch. Open-ended when absent.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Most recent rows shown in the table.
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,
}

impl MarketConfig {
    pub fn request(&self) -> CandleRequest {
        CandleRequest::history(
            self.symbol.clone(),
            self.interval,
            self.start.and_time(NaiveTime::MIN).and_utc(),
            self.end.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
        )
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: default_interval(),
            start: default_start(),
            end: None,
            display_limit: default_display_limit(),
        }
    }
}

impl Default for MarketFileConfig {
    fn default() -> Self {
        Self {
            markets: vec![MarketConfig::default()],
        }
    }
}

impl MarketFileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse markets config: {e}")))?;
        if cfg.markets.is_empty() {
            return Err(Error::Config("markets config lists no markets".into()));
        }
        if let Some(m) = cfg.markets.iter().find(|m| m.symbol.trim().is_empty()) {
            return Err(Error::Config(format!(
                "market starting {} has an empty symbol",
                m.start
            )));
        }
        Ok(cfg)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read markets config at '{}': {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Load from `path` if it exists, otherwise fall back to a single weekly
    /// BTCUSDT market.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

fn default_interval() -> Interval {
    Interval::OneWeek
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default()
}

fn default_display_limit() -> usize {
    100
}
