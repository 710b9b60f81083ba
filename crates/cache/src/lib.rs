//! In-process TTL caching for fetched candles and computed analyses.

pub mod keys;
pub mod store;

pub use keys::{market_key, sequence_key};
pub use store::{CacheStats, TtlCache};
