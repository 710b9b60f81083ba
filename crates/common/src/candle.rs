use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One fixed-interval OHLC(V) bar.
///
/// Only constructible through [`Candle::new`] (deserialization goes through the
/// same checks), so every `Candle` in a sequence satisfies
/// `low <= min(open, close) <= max(open, close) <= high` with finite,
/// non-negative prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCandle")]
pub struct Candle {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume: Option<f64>,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidCandle { timestamp, reason };

        for (name, value) in [("open", open), ("high", high), ("low", low), ("close", close)] {
            if !value.is_finite() {
                return Err(invalid(format!("{name} price is not a finite number")));
            }
            if value < 0.0 {
                return Err(invalid(format!("{name} price is negative ({value})")));
            }
        }
        if let Some(v) = volume {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(format!("volume must be finite and non-negative ({v})")));
            }
        }
        if high < low {
            return Err(invalid(format!("high {high} is below low {low}")));
        }
        if high < open.max(close) {
            return Err(invalid(format!("high {high} is below the candle body")));
        }
        if low > open.min(close) {
            return Err(invalid(format!("low {low} is above the candle body")));
        }

        Ok(Self { timestamp, open, high, low, close, volume })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> Option<f64> {
        self.volume
    }

    /// Green candle: closed above its open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Red candle: closed below its open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Open equals close. Neither bullish nor bearish.
    pub fn is_doji(&self) -> bool {
        self.close == self.open
    }

    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.body_top()
    }

    pub fn lower_shadow(&self) -> f64 {
        self.body_bottom() - self.low
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

impl std::fmt::Display for Candle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.is_bullish() {
            "▲"
        } else if self.is_bearish() {
            "▼"
        } else {
            "•"
        };
        write!(
            f,
            "{marker} {} O:{} H:{} L:{} C:{}",
            self.timestamp.format("%Y-%m-%d"),
            self.open,
            self.high,
            self.low,
            self.close
        )
    }
}

#[derive(Deserialize)]
struct RawCandle {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

impl TryFrom<RawCandle> for Candle {
    type Error = Error;

    fn try_from(raw: RawCandle) -> Result<Self> {
        Candle::new(raw.timestamp, raw.open, raw.high, raw.low, raw.close, raw.volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn classifies_bullish_bearish_and_doji() {
        let green = Candle::new(ts(), 100.0, 110.0, 95.0, 105.0, None).unwrap();
        assert!(green.is_bullish() && !green.is_bearish() && !green.is_doji());

        let red = Candle::new(ts(), 105.0, 110.0, 95.0, 100.0, None).unwrap();
        assert!(red.is_bearish() && !red.is_bullish());

        let doji = Candle::new(ts(), 100.0, 110.0, 90.0, 100.0, None).unwrap();
        assert!(doji.is_doji() && !doji.is_bullish() && !doji.is_bearish());
    }

    #[test]
    fn derived_measures() {
        let c = Candle::new(ts(), 100.0, 115.0, 80.0, 110.0, Some(12.5)).unwrap();
        assert_eq!(c.body_size(), 10.0);
        assert_eq!(c.body_top(), 110.0);
        assert_eq!(c.body_bottom(), 100.0);
        assert_eq!(c.upper_shadow(), 5.0);
        assert_eq!(c.lower_shadow(), 20.0);
        assert_eq!(c.range(), 35.0);
        assert_eq!(c.volume(), Some(12.5));
    }

    #[test]
    fn zero_range_candle_is_valid() {
        let flat = Candle::new(ts(), 50.0, 50.0, 50.0, 50.0, Some(0.0)).unwrap();
        assert!(flat.is_doji());
        assert_eq!(flat.range(), 0.0);
    }

    #[test]
    fn rejects_high_below_low() {
        let err = Candle::new(ts(), 100.0, 90.0, 95.0, 100.0, None).unwrap_err();
        assert!(matches!(err, Error::InvalidCandle { .. }));
    }

    #[test]
    fn rejects_high_below_body() {
        assert!(Candle::new(ts(), 100.0, 104.0, 95.0, 105.0, None).is_err());
    }

    #[test]
    fn rejects_low_above_body() {
        assert!(Candle::new(ts(), 100.0, 110.0, 101.0, 105.0, None).is_err());
    }

    #[test]
    fn rejects_negative_and_non_finite_values() {
        assert!(Candle::new(ts(), -1.0, 10.0, -2.0, 5.0, None).is_err());
        assert!(Candle::new(ts(), f64::NAN, 10.0, 1.0, 5.0, None).is_err());
        assert!(Candle::new(ts(), 2.0, 10.0, 1.0, 5.0, Some(-3.0)).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok = r#"{"timestamp":"2024-01-01T00:00:00Z","open":1.0,"high":2.0,"low":0.5,"close":1.5}"#;
        let candle: Candle = serde_json::from_str(ok).unwrap();
        assert_eq!(candle.volume(), None);

        let bad = r#"{"timestamp":"2024-01-01T00:00:00Z","open":1.0,"high":0.9,"low":0.5,"close":1.5}"#;
        assert!(serde_json::from_str::<Candle>(bad).is_err());
    }

    #[test]
    fn display_shows_direction_and_prices() {
        let red = Candle::new(ts(), 105.0, 110.0, 95.0, 100.0, None).unwrap();
        assert_eq!(red.to_string(), "▼ 2024-01-01 O:105 H:110 L:95 C:100");
    }
}
