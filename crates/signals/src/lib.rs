//! Engulfing-pattern signal engine.
//!
//! Pure, synchronous computation over an ordered candle snapshot:
//! `candles -> PatternDetector -> SignalGenerator -> CommentaryGenerator`,
//! composed by [`SignalEngine::analyze`]. Nothing here performs I/O or holds
//! shared state, so independent passes can run concurrently without
//! coordination.

pub mod commentary;
pub mod config;
pub mod engine;
pub mod generator;
pub mod pattern;
pub mod summary;

pub use commentary::{CommentaryGenerator, NO_ACTIONABLE_PATTERN};
pub use config::{MarketConfig, MarketFileConfig};
pub use engine::{analyze, SignalEngine};
pub use generator::{body_ratio, volume_change_pct, SignalGenerator};
pub use pattern::{classify, engulfment_confidence, PatternDetector};
pub use summary::{AnalysisStats, SignalSummary};
