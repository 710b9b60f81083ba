use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Candle;

/// Kind of two-candle engulfing pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    BullishEngulfing,
    BearishEngulfing,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::BullishEngulfing => "BULLISH_ENGULFING",
            PatternKind::BearishEngulfing => "BEARISH_ENGULFING",
        }
    }

    /// Direction a confirmed pattern of this kind trades in.
    pub fn signal_type(&self) -> SignalType {
        match self {
            PatternKind::BullishEngulfing => SignalType::GoLong,
            PatternKind::BearishEngulfing => SignalType::GoShort,
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternKind::BullishEngulfing => write!(f, "Bullish Engulfing"),
            PatternKind::BearishEngulfing => write!(f, "Bearish Engulfing"),
        }
    }
}

/// Direction of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    GoLong,
    GoShort,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::GoLong => "GO_LONG",
            SignalType::GoShort => "GO_SHORT",
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::GoLong => write!(f, "Go Long"),
            SignalType::GoShort => write!(f, "Go Short"),
        }
    }
}

/// Bucketed confidence, used for summaries and commentary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            ConfidenceLevel::VeryHigh
        } else if confidence >= 0.75 {
            ConfidenceLevel::High
        } else if confidence >= 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn strength(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "Very Strong",
            ConfidenceLevel::High => "Strong",
            ConfidenceLevel::Medium => "Moderate",
            ConfidenceLevel::Low => "Weak",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::Low => write!(f, "LOW"),
            ConfidenceLevel::Medium => write!(f, "MEDIUM"),
            ConfidenceLevel::High => write!(f, "HIGH"),
            ConfidenceLevel::VeryHigh => write!(f, "VERY_HIGH"),
        }
    }
}

/// An engulfing relationship between two adjacent candles of a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub prior: Candle,
    pub current: Candle,
    /// Position of `current` in the scanned sequence. `prior` sits one before it.
    pub current_index: usize,
    /// Degree of engulfment in [0, 1].
    pub confidence: f64,
}

impl Pattern {
    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.confidence)
    }

    /// Timestamp of the candle that completed the pattern.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.current.timestamp()
    }
}

/// Directional recommendation, actionable at the open of the trigger candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub signal_type: SignalType,
    pub pattern_kind: PatternKind,
    /// Timestamp of the pattern's second candle.
    pub pattern_timestamp: DateTime<Utc>,
    /// Timestamp of the candle following the pattern.
    pub trigger_timestamp: DateTime<Utc>,
    /// Open price of the trigger candle.
    pub entry_price: f64,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    /// Engulfing body size over engulfed body size.
    pub body_ratio: f64,
    /// Percent volume change from the engulfed to the engulfing candle. `None`
    /// unless both candles carry a volume and the engulfed one is non-zero.
    pub volume_change_pct: Option<f64>,
}

/// Display-side classification of a row. The presentation layer maps it to styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalTag {
    GoLong,
    GoShort,
    None,
}

impl std::fmt::Display for SignalTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalTag::GoLong => write!(f, "GO_LONG"),
            SignalTag::GoShort => write!(f, "GO_SHORT"),
            SignalTag::None => write!(f, "NONE"),
        }
    }
}

/// A pattern completed on a given candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormedPattern {
    pub kind: PatternKind,
    pub confidence: f64,
    /// False when no trigger candle follows in the analyzed sequence yet.
    pub confirmed: bool,
}

/// One output row of an analysis pass, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub candle: Candle,
    /// Signal whose trigger candle is this candle.
    pub signal: Option<Signal>,
    /// Pattern whose second candle is this candle.
    pub formed: Option<FormedPattern>,
    pub commentary: String,
}

impl AnalysisRow {
    pub fn tag(&self) -> SignalTag {
        match self.signal.as_ref().map(|s| s.signal_type) {
            Some(SignalType::GoLong) => SignalTag::GoLong,
            Some(SignalType::GoShort) => SignalTag::GoShort,
            None => SignalTag::None,
        }
    }

    /// A pattern completed here but the sequence ends before its trigger candle.
    pub fn is_unconfirmed(&self) -> bool {
        self.formed.is_some_and(|f| !f.confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_levels_follow_thresholds() {
        assert_eq!(ConfidenceLevel::from_confidence(0.95), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_confidence(0.9), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_confidence(0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.5), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.49), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::Medium.strength(), "Moderate");
    }

    #[test]
    fn pattern_kind_maps_to_direction() {
        assert_eq!(PatternKind::BullishEngulfing.signal_type(), SignalType::GoLong);
        assert_eq!(PatternKind::BearishEngulfing.signal_type(), SignalType::GoShort);
    }

    #[test]
    fn enums_serialize_in_wire_case() {
        assert_eq!(
            serde_json::to_string(&PatternKind::BullishEngulfing).unwrap(),
            "\"BULLISH_ENGULFING\""
        );
        assert_eq!(serde_json::to_string(&SignalType::GoShort).unwrap(), "\"GO_SHORT\"");
        assert_eq!(serde_json::to_string(&SignalTag::None).unwrap(), "\"NONE\"");
    }
}
