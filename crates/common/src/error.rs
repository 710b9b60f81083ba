use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// OHLC invariants violated at construction. The offending data must be
    /// discarded or re-fetched by the caller.
    #[error("Invalid candle at {timestamp}: {reason}")]
    InvalidCandle {
        timestamp: DateTime<Utc>,
        reason: String,
    },

    /// A pattern references a candle position that does not exist (or holds a
    /// different candle) in the sequence handed to the signal generator.
    #[error("Sequence mismatch: pattern references candle {index} in a sequence of {len}")]
    SequenceMismatch { index: usize, len: usize },

    #[error("Candle sequence not strictly ordered by timestamp at index {index}")]
    UnorderedSequence { index: usize },

    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
