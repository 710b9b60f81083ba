use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use common::{Candle, Interval};

// ─── Cache keys ──────────────────────────────────────────────────────────────

/// Key for a fetched candle series. An open-ended range keys on `open`, so a
/// "until now" request shares one entry until its TTL lapses.
pub fn market_key(
    symbol: &str,
    interval: Interval,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> String {
    let bound = |t: Option<DateTime<Utc>>| t.map_or_else(|| "open".to_string(), |t| t.to_rfc3339());
    format!(
        "market:{}:{interval}:{}:{}",
        symbol.to_ascii_uppercase(),
        bound(start),
        bound(end)
    )
}

/// Content hash of a candle sequence: equal sequences produce equal keys.
///
/// Hashes timestamps and the IEEE-754 bits of every price so the key does not
/// depend on any textual float formatting.
pub fn sequence_key(candles: &[Candle]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((candles.len() as u64).to_le_bytes());
    for c in candles {
        hasher.update(c.timestamp().timestamp_millis().to_le_bytes());
        for price in [c.open(), c.high(), c.low(), c.close()] {
            hasher.update(price.to_bits().to_le_bytes());
        }
        match c.volume() {
            Some(v) => {
                hasher.update([1u8]);
                hasher.update(v.to_bits().to_le_bytes());
            }
            None => hasher.update([0u8]),
        }
    }
    format!("analysis:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn candle(day: i64, close: f64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day);
        Candle::new(ts, 100.0, 120.0, 80.0, close, None).unwrap()
    }

    #[test]
    fn market_key_normalises_symbol_and_open_bounds() {
        let start = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            market_key("btcusdt", Interval::OneWeek, Some(start), None),
            "market:BTCUSDT:1w:2019-01-01T00:00:00+00:00:open"
        );
        assert_ne!(
            market_key("BTCUSDT", Interval::OneWeek, Some(start), None),
            market_key("BTCUSDT", Interval::OneDay, Some(start), None)
        );
    }

    #[test]
    fn sequence_key_is_stable_and_content_sensitive() {
        let a = vec![candle(0, 110.0), candle(1, 90.0)];
        let b = vec![candle(0, 110.0), candle(1, 90.0)];
        let c = vec![candle(0, 110.0), candle(1, 91.0)];

        assert_eq!(sequence_key(&a), sequence_key(&b));
        assert_ne!(sequence_key(&a), sequence_key(&c));
        assert_ne!(sequence_key(&a), sequence_key(&a[..1]));
    }

    #[test]
    fn sequence_key_is_prefixed_hex_digest() {
        let key = sequence_key(&[]);
        let digest = key.strip_prefix("analysis:").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
