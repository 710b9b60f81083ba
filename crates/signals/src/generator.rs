use common::{Candle, Error, Pattern, Result, Signal};

/// Turns detected patterns into signals timed to the candle after the pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalGenerator;

impl SignalGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produce one signal per pattern that has a following candle in `candles`.
    ///
    /// Patterns completed on the last candle are skipped: they are detected but
    /// not yet actionable. Fails with `SequenceMismatch` if any pattern does
    /// not line up with `candles`.
    pub fn generate(&self, candles: &[Candle], patterns: &[Pattern]) -> Result<Vec<Signal>> {
        let mut signals = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            if let Some(signal) = self.signal_for(candles, pattern)? {
                signals.push(signal);
            }
        }
        Ok(signals)
    }

    /// Signal for a single pattern, `None` when no trigger candle exists yet.
    pub fn signal_for(&self, candles: &[Candle], pattern: &Pattern) -> Result<Option<Signal>> {
        let index = pattern.current_index;
        let mismatch = || Error::SequenceMismatch {
            index,
            len: candles.len(),
        };

        if index == 0 || index >= candles.len() {
            return Err(mismatch());
        }
        if candles[index - 1] != pattern.prior || candles[index] != pattern.current {
            return Err(mismatch());
        }

        let Some(trigger) = candles.get(index + 1) else {
            return Ok(None);
        };

        let pattern_timestamp = pattern.current.timestamp();
        Ok(Some(Signal {
            id: format!(
                "{}_{}",
                pattern.kind.as_str(),
                pattern_timestamp.format("%Y%m%d_%H%M%S")
            ),
            signal_type: pattern.kind.signal_type(),
            pattern_kind: pattern.kind,
            pattern_timestamp,
            trigger_timestamp: trigger.timestamp(),
            entry_price: trigger.open(),
            confidence: pattern.confidence,
            confidence_level: pattern.confidence_level(),
            body_ratio: body_ratio(&pattern.prior, &pattern.current),
            volume_change_pct: volume_change_pct(&pattern.prior, &pattern.current),
        }))
    }
}

/// How many times the engulfed body fits into the engulfing one.
pub fn body_ratio(prior: &Candle, current: &Candle) -> f64 {
    let prior_body = prior.body_size();
    if prior_body <= 0.0 {
        return 0.0;
    }
    current.body_size() / prior_body
}

/// Percent change in volume from `prior` to `current`, when both are known and
/// the prior volume is non-zero.
pub fn volume_change_pct(prior: &Candle, current: &Candle) -> Option<f64> {
    match (prior.volume(), current.volume()) {
        (Some(before), Some(after)) if before > 0.0 => Some((after / before - 1.0) * 100.0),
        _ => None,
    }
}
