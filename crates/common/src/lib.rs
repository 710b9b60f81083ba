pub mod candle;
pub mod config;
pub mod error;
pub mod exchange;
pub mod market;
pub mod types;

pub use candle::Candle;
pub use config::Config;
pub use error::{Error, Result};
pub use exchange::CandleSource;
pub use market::{CandleRequest, Interval, MarketData};
pub use types::*;
