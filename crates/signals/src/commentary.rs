use common::{Candle, FormedPattern, Signal};

/// Every row without a signal starts with this phrase.
pub const NO_ACTIONABLE_PATTERN: &str = "No actionable pattern";

/// Builds the per-candle commentary shown next to each row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentaryGenerator;

impl CommentaryGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Describe `candle` given the signal that triggers on it (if any) and the
    /// pattern completed on it (if any).
    pub fn describe(
        &self,
        candle: &Candle,
        signal: Option<&Signal>,
        formed: Option<&FormedPattern>,
    ) -> String {
        let mut text = match signal {
            Some(signal) => self.signal_text(signal),
            None => format!(
                "{NO_ACTIONABLE_PATTERN} at {}.",
                candle.timestamp().format("%Y-%m-%d")
            ),
        };

        if let Some(formed) = formed {
            text.push(' ');
            text.push_str(&self.formed_text(formed));
        }
        text
    }

    pub fn signal_text(&self, signal: &Signal) -> String {
        let volume = match signal.volume_change_pct {
            Some(pct) if pct >= 0.0 => format!(" with {pct:.1}% volume increase"),
            Some(pct) => format!(" with {:.1}% volume decrease", -pct),
            None => String::new(),
        };
        format!(
            "{} confirmed: {} at {:.2} (confidence {:.1}%, {}). \
             The engulfing candle shows {:.1}x body size expansion{volume}.",
            signal.pattern_kind,
            signal.signal_type,
            signal.entry_price,
            signal.confidence * 100.0,
            signal.confidence_level.strength(),
            signal.body_ratio
        )
    }

    fn formed_text(&self, formed: &FormedPattern) -> String {
        if formed.confirmed {
            format!(
                "{} completed on this candle; {} signal triggers at the next candle open.",
                formed.kind,
                formed.kind.signal_type()
            )
        } else {
            format!(
                "{} completed on this candle; awaiting the next candle open to trigger {}.",
                formed.kind,
                formed.kind.signal_type()
            )
        }
    }

    /// Commentary for every candle of a sequence too short to hold a pattern.
    pub fn insufficient_history(&self) -> String {
        format!("{NO_ACTIONABLE_PATTERN} possible: at least two candles are required.")
    }
}
