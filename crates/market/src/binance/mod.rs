pub mod kline;
pub mod rest;

pub use kline::{dedupe_sorted, parse_kline, parse_klines};
pub use rest::{BinanceKlines, DEFAULT_BASE_URL, MAX_KLINES_PER_REQUEST};
