use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use cache::{market_key, sequence_key, CacheStats, TtlCache};
use common::{AnalysisRow, Candle, CandleSource, MarketData, Result};
use signals::{MarketConfig, SignalEngine};

/// Fetches candles and analyses them, memoising both steps.
///
/// Candle series are keyed by market and range; analyses are keyed by the
/// content hash of the candles, so an unchanged refetch reuses the previous
/// analysis.
pub struct Watcher<S> {
    source: S,
    engine: SignalEngine,
    candles: TtlCache<Vec<Candle>>,
    analyses: TtlCache<Vec<AnalysisRow>>,
}

impl<S: CandleSource> Watcher<S> {
    pub fn new(source: S, candle_ttl: Duration, analysis_ttl: Duration) -> Self {
        Self {
            source,
            engine: SignalEngine::new(),
            candles: TtlCache::new(candle_ttl),
            analyses: TtlCache::new(analysis_ttl),
        }
    }

    /// Fetch (or reuse) the market's candles and analyze them.
    pub async fn run_market(
        &mut self,
        market: &MarketConfig,
        now: DateTime<Utc>,
    ) -> Result<(MarketData, Vec<AnalysisRow>)> {
        let data = self.market_data(market, now).await?;
        let rows = self.analyze(&data.candles, now)?;
        Ok((data, rows))
    }

    async fn market_data(&mut self, market: &MarketConfig, now: DateTime<Utc>) -> Result<MarketData> {
        let request = market.request();
        let key = market_key(&request.symbol, request.interval, request.start, request.end);

        if let Some(cached) = self.candles.get(&key, now) {
            debug!(symbol = %request.symbol, candles = cached.len(), "Candle cache hit");
            return Ok(MarketData {
                symbol: request.symbol,
                interval: request.interval,
                candles: cached.clone(),
                last_updated: now,
            });
        }

        let candles = self.source.fetch_candles(&request).await?;
        info!(
            symbol = %request.symbol,
            interval = %request.interval,
            candles = candles.len(),
            "Fetched candles"
        );

        let data = MarketData {
            symbol: request.symbol,
            interval: request.interval,
            candles,
            last_updated: now,
        };
        data.validate()?;
        self.candles.insert(key, data.candles.clone(), now);
        Ok(data)
    }

    fn analyze(&mut self, candles: &[Candle], now: DateTime<Utc>) -> Result<Vec<AnalysisRow>> {
        let key = sequence_key(candles);
        if let Some(rows) = self.analyses.get(&key, now) {
            debug!(rows = rows.len(), "Analysis cache hit");
            return Ok(rows.clone());
        }

        let rows = self.engine.analyze(candles)?;
        self.analyses.insert(key, rows.clone(), now);
        Ok(rows)
    }

    /// Drop expired entries from both caches and report what remains.
    pub fn purge(&mut self, now: DateTime<Utc>) -> (CacheStats, CacheStats) {
        self.candles.purge_expired(now);
        self.analyses.purge_expired(now);
        (self.candles.stats(now), self.analyses.stats(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use common::{CandleRequest, Error, SignalTag};

    struct FakeSource {
        candles: Vec<Candle>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CandleSource for FakeSource {
        async fn fetch_candles(&self, _request: &CandleRequest) -> Result<Vec<Candle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.candles.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CandleSource for FailingSource {
        async fn fetch_candles(&self, _request: &CandleRequest) -> Result<Vec<Candle>> {
            Err(Error::Http("connection refused".into()))
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn week(n: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::weeks(n);
        Candle::new(ts, open, high, low, close, Some(10.0)).unwrap()
    }

    fn bullish_series() -> Vec<Candle> {
        vec![
            week(0, 100.0, 105.0, 88.0, 90.0),
            week(1, 88.0, 112.0, 87.0, 110.0),
            week(2, 112.0, 115.0, 108.0, 113.0),
        ]
    }

    fn watcher(candles: Vec<Candle>) -> (Watcher<FakeSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FakeSource {
            candles,
            calls: calls.clone(),
        };
        (
            Watcher::new(source, Duration::hours(1), Duration::minutes(30)),
            calls,
        )
    }

    #[tokio::test]
    async fn analyzes_fetched_market() {
        let (mut watcher, _) = watcher(bullish_series());
        let (data, rows) = watcher.run_market(&MarketConfig::default(), t0()).await.unwrap();

        assert_eq!(data.symbol, "BTCUSDT");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].tag(), SignalTag::GoLong);
        assert_eq!(rows[2].signal.as_ref().unwrap().entry_price, 112.0);
    }

    #[tokio::test]
    async fn candles_are_reused_within_ttl() {
        let (mut watcher, calls) = watcher(bullish_series());
        let market = MarketConfig::default();

        watcher.run_market(&market, t0()).await.unwrap();
        watcher.run_market(&market, t0() + Duration::minutes(59)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        watcher.run_market(&market, t0() + Duration::minutes(61)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn purge_reports_cache_occupancy() {
        let (mut watcher, _) = watcher(bullish_series());
        watcher.run_market(&MarketConfig::default(), t0()).await.unwrap();

        let (candles, analyses) = watcher.purge(t0() + Duration::minutes(45));
        assert_eq!(candles.active, 1);
        assert_eq!(analyses.total, 0);
    }

    #[tokio::test]
    async fn empty_history_is_an_error() {
        let (mut watcher, _) = watcher(Vec::new());
        let err = watcher
            .run_market(&MarketConfig::default(), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn source_errors_propagate() {
        let mut watcher = Watcher::new(FailingSource, Duration::hours(1), Duration::hours(1));
        let err = watcher
            .run_market(&MarketConfig::default(), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
