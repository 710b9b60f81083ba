use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use common::{Candle, CandleRequest, CandleSource, Error, Interval, Result};

use super::kline::{dedupe_sorted, parse_klines};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance caps a klines request at this many rows.
pub const MAX_KLINES_PER_REQUEST: u32 = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const BATCH_PAUSE: Duration = Duration::from_millis(100);

/// Public-market REST client for Binance klines. No API key is needed.
pub struct BinanceKlines {
    base_url: String,
    http: Client,
}

impl BinanceKlines {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get(&self, path: &str, query: &str) -> Result<String> {
        let url = if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        };

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }

    async fn klines(
        &self,
        symbol: &str,
        interval: Interval,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let mut query = format!(
            "symbol={symbol}&interval={interval}&limit={}",
            limit.clamp(1, MAX_KLINES_PER_REQUEST)
        );
        if let Some(start) = start {
            query.push_str(&format!("&startTime={}", start.timestamp_millis()));
        }
        if let Some(end) = end {
            query.push_str(&format!("&endTime={}", end.timestamp_millis()));
        }

        debug!(%symbol, %interval, ?start, ?end, "Requesting klines");
        let body = self.get("/api/v3/klines", &query).await?;
        parse_klines(&body)
    }

    /// The latest `limit` candles.
    pub async fn fetch_recent(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let candles = self.klines(symbol, interval, None, None, limit).await?;
        Ok(dedupe_sorted(candles))
    }

    /// Complete history from `start` to `end` (now when `None`), paged in
    /// batches of `MAX_KLINES_PER_REQUEST` with a short pause between requests.
    pub async fn fetch_history(
        &self,
        symbol: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>> {
        let end = end.unwrap_or_else(Utc::now);
        let mut all = Vec::new();
        let mut cursor = start;

        while cursor < end {
            let batch = self
                .klines(symbol, interval, Some(cursor), Some(end), MAX_KLINES_PER_REQUEST)
                .await?;
            let Some(last) = batch.last() else {
                debug!(%symbol, cursor = %cursor, "Empty batch, history complete");
                break;
            };

            let next = last.timestamp() + chrono::Duration::milliseconds(1);
            let short = (batch.len() as u32) < MAX_KLINES_PER_REQUEST;
            debug!(%symbol, candles = batch.len(), from = %cursor, "Fetched kline batch");
            all.extend(batch);

            if short || next <= cursor {
                break;
            }
            cursor = next;
            tokio::time::sleep(BATCH_PAUSE).await;
        }

        let candles = dedupe_sorted(all);
        match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => info!(
                %symbol,
                %interval,
                candles = candles.len(),
                first = %first.timestamp().format("%Y-%m-%d"),
                last = %last.timestamp().format("%Y-%m-%d"),
                "Fetched candle history"
            ),
            _ => warn!(%symbol, %interval, "No candle history returned"),
        }
        Ok(candles)
    }

    /// Exchange server time, for clock sanity checks.
    pub async fn server_time(&self) -> Result<DateTime<Utc>> {
        let body = self.get("/api/v3/time", "").await?;
        let resp: ServerTime = serde_json::from_str(&body)?;
        Utc.timestamp_millis_opt(resp.server_time)
            .single()
            .ok_or_else(|| Error::Exchange(format!("server time {} out of range", resp.server_time)))
    }

    /// True if the API answers a server-time request.
    pub async fn check_connection(&self) -> bool {
        match self.server_time().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Binance API unreachable");
                false
            }
        }
    }
}

#[async_trait]
impl CandleSource for BinanceKlines {
    async fn fetch_candles(&self, request: &CandleRequest) -> Result<Vec<Candle>> {
        match request.start {
            Some(start) => {
                self.fetch_history(&request.symbol, request.interval, start, request.end)
                    .await
            }
            None => {
                let limit = request.limit.unwrap_or(100);
                self.fetch_recent(&request.symbol, request.interval, limit)
                    .await
            }
        }
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTime {
    server_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = BinanceKlines::new("http://localhost:9000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[test]
    fn server_time_response_parses() {
        let resp: ServerTime = serde_json::from_str(r#"{"serverTime":1704067200000}"#).unwrap();
        assert_eq!(resp.server_time, 1_704_067_200_000);
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = BinanceKlines::new("http://127.0.0.1:9").unwrap();
        let err = client
            .fetch_recent("BTCUSDT", Interval::OneWeek, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(!client.check_connection().await);
    }
}
