mod report;
mod watch;

use std::time::Duration as StdDuration;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{CandleSource, Config};
use market::BinanceKlines;
use signals::{MarketConfig, MarketFileConfig};

use watch::Watcher;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {e}"));
    let markets = MarketFileConfig::load_or_default(&cfg.markets_config_path)
        .unwrap_or_else(|e| panic!("Failed to load markets config: {e}"));
    info!(
        markets = markets.markets.len(),
        refresh_secs = ?cfg.refresh_secs,
        "EngulfWatch starting"
    );

    // ── Market data ───────────────────────────────────────────────────────────
    let source = BinanceKlines::new(&cfg.binance_base_url)
        .unwrap_or_else(|e| panic!("Failed to build Binance client: {e}"));
    if !source.check_connection().await {
        warn!(url = %cfg.binance_base_url, "Binance API did not answer; fetches may fail");
    }

    let candle_ttl = cfg
        .candle_cache_ttl()
        .unwrap_or_else(|e| panic!("Invalid configuration: {e}"));
    let analysis_ttl = cfg
        .analysis_cache_ttl()
        .unwrap_or_else(|e| panic!("Invalid configuration: {e}"));
    let mut watcher = Watcher::new(source, candle_ttl, analysis_ttl);

    // ── Run ───────────────────────────────────────────────────────────────────
    let Some(refresh_secs) = cfg.refresh_secs else {
        run_round(&mut watcher, &markets.markets).await;
        return;
    };

    let mut ticker = tokio::time::interval(StdDuration::from_secs(refresh_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => run_round(&mut watcher, &markets.markets).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting.");
                break;
            }
        }
    }
}

/// Analyze every configured market once. A failing market is logged and
/// skipped.
async fn run_round<S: CandleSource>(watcher: &mut Watcher<S>, markets: &[MarketConfig]) {
    let now = Utc::now();
    for market in markets {
        match watcher.run_market(market, now).await {
            Ok((data, rows)) => {
                println!("{}", report::render_table(&rows, market.display_limit));
                println!("{}", report::render_summary(&data, &rows));
            }
            Err(e) => error!(symbol = %market.symbol, error = %e, "Market analysis failed"),
        }
    }

    let (candles, analyses) = watcher.purge(now);
    debug!(
        candle_entries = candles.active,
        analysis_entries = analyses.active,
        "Cache occupancy"
    );
}
