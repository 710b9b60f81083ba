pub mod binance;

pub use binance::{BinanceKlines, DEFAULT_BASE_URL};
