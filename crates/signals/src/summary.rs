use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use common::{AnalysisRow, ConfidenceLevel, Signal, SignalType};

/// Aggregate view over a set of signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSummary {
    pub total_signals: usize,
    pub long_signals: usize,
    pub short_signals: usize,
    pub avg_confidence: f64,
    pub confidence_distribution: BTreeMap<ConfidenceLevel, usize>,
    pub latest_trigger: Option<DateTime<Utc>>,
}

impl SignalSummary {
    pub fn from_signals<'a, I>(signals: I) -> Self
    where
        I: IntoIterator<Item = &'a Signal>,
    {
        let mut summary = SignalSummary {
            total_signals: 0,
            long_signals: 0,
            short_signals: 0,
            avg_confidence: 0.0,
            confidence_distribution: BTreeMap::new(),
            latest_trigger: None,
        };
        let mut confidence_sum = 0.0;

        for signal in signals {
            summary.total_signals += 1;
            match signal.signal_type {
                SignalType::GoLong => summary.long_signals += 1,
                SignalType::GoShort => summary.short_signals += 1,
            }
            confidence_sum += signal.confidence;
            *summary
                .confidence_distribution
                .entry(signal.confidence_level)
                .or_insert(0) += 1;
            summary.latest_trigger = summary.latest_trigger.max(Some(signal.trigger_timestamp));
        }

        if summary.total_signals > 0 {
            summary.avg_confidence = confidence_sum / summary.total_signals as f64;
        }
        summary
    }
}

/// Counts and rates for one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisStats {
    pub candles_analyzed: usize,
    pub patterns_detected: usize,
    pub signals_generated: usize,
    pub unconfirmed_patterns: usize,
}

impl AnalysisStats {
    pub fn from_rows(rows: &[AnalysisRow]) -> Self {
        Self {
            candles_analyzed: rows.len(),
            patterns_detected: rows.iter().filter(|r| r.formed.is_some()).count(),
            signals_generated: rows.iter().filter(|r| r.signal.is_some()).count(),
            unconfirmed_patterns: rows.iter().filter(|r| r.is_unconfirmed()).count(),
        }
    }

    /// Patterns per analyzed candle.
    pub fn pattern_detection_rate(&self) -> f64 {
        if self.candles_analyzed == 0 {
            return 0.0;
        }
        self.patterns_detected as f64 / self.candles_analyzed as f64
    }

    /// Signals per detected pattern.
    pub fn signal_generation_rate(&self) -> f64 {
        if self.patterns_detected == 0 {
            return 0.0;
        }
        self.signals_generated as f64 / self.patterns_detected as f64
    }
}
