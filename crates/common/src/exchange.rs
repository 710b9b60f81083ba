use async_trait::async_trait;

use crate::{Candle, CandleRequest, Result};

/// Abstraction over the market-data provider.
///
/// `BinanceKlines` in `crates/market` implements this against the public REST
/// API. Implementations must return candles ordered by strictly increasing
/// timestamp, already validated by `Candle::new`.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch the candle history described by `request`.
    async fn fetch_candles(&self, request: &CandleRequest) -> Result<Vec<Candle>>;
}
