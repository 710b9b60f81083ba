use chrono::{TimeZone, Utc};
use serde_json::Value;
use tracing::warn;

use common::{Candle, Error, Result};

// ─── Binance kline JSON parsing ──────────────────────────────────────────────
//
// `GET /api/v3/klines` returns an array of arrays:
// [openTime, "open", "high", "low", "close", "volume", closeTime, ...]

/// Parse a klines response body. Rows that are malformed or violate candle
/// invariants are skipped with a warning; a body that is not a JSON array is
/// an error.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Value> = serde_json::from_str(body)?;

    let candles = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| match parse_kline(row) {
            Ok(candle) => Some(candle),
            Err(e) => {
                warn!(row = i, error = %e, "Skipping kline row");
                None
            }
        })
        .collect();

    Ok(candles)
}

/// Parse a single kline row into a validated candle.
pub fn parse_kline(row: &Value) -> Result<Candle> {
    let fields = row
        .as_array()
        .ok_or_else(|| Error::Exchange("kline row is not an array".into()))?;
    if fields.len() < 6 {
        return Err(Error::Exchange(format!(
            "kline row has {} fields, expected at least 6",
            fields.len()
        )));
    }

    let open_time_ms = fields[0]
        .as_i64()
        .ok_or_else(|| Error::Exchange("kline open time is not an integer".into()))?;
    let timestamp = Utc
        .timestamp_millis_opt(open_time_ms)
        .single()
        .ok_or_else(|| Error::Exchange(format!("kline open time {open_time_ms} out of range")))?;

    Candle::new(
        timestamp,
        number(&fields[1], "open")?,
        number(&fields[2], "high")?,
        number(&fields[3], "low")?,
        number(&fields[4], "close")?,
        Some(number(&fields[5], "volume")?),
    )
}

/// Binance sends prices as decimal strings; accept plain numbers too.
fn number(value: &Value, name: &str) -> Result<f64> {
    match value {
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| Error::Exchange(format!("kline {name} '{s}': {e}"))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Exchange(format!("kline {name} is not representable"))),
        _ => Err(Error::Exchange(format!("kline {name} has unexpected type"))),
    }
}

/// Sort by timestamp and keep the first candle seen for each timestamp.
pub fn dedupe_sorted(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.timestamp());
    candles.dedup_by_key(|c| c.timestamp());
    candles
}
