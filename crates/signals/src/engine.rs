use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use common::{AnalysisRow, Candle, Error, FormedPattern, Pattern, Result, Signal};

use crate::commentary::CommentaryGenerator;
use crate::generator::SignalGenerator;
use crate::pattern::PatternDetector;

/// Runs detection, signal timing and commentary over a candle sequence in a
/// single stateless pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalEngine {
    detector: PatternDetector,
    generator: SignalGenerator,
    commentary: CommentaryGenerator,
}

impl SignalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce one row per input candle, in input order.
    ///
    /// `candles` must be ordered by strictly increasing timestamp. Identical
    /// input always yields identical output.
    pub fn analyze(&self, candles: &[Candle]) -> Result<Vec<AnalysisRow>> {
        if candles.len() < 2 {
            let commentary = self.commentary.insufficient_history();
            return Ok(candles
                .iter()
                .map(|candle| AnalysisRow {
                    candle: *candle,
                    signal: None,
                    formed: None,
                    commentary: commentary.clone(),
                })
                .collect());
        }

        ensure_ordered(candles)?;

        let patterns: Vec<Pattern> = self.detector.detect(candles).collect();
        let signals = self.generator.generate(candles, &patterns)?;

        let last = candles.len() - 1;
        let mut formed: Vec<Option<FormedPattern>> = vec![None; candles.len()];
        for pattern in &patterns {
            formed[pattern.current_index] = Some(FormedPattern {
                kind: pattern.kind,
                confidence: pattern.confidence,
                confirmed: pattern.current_index < last,
            });
        }

        debug!(
            candles = candles.len(),
            patterns = patterns.len(),
            signals = signals.len(),
            "Analysis pass complete"
        );

        // Each pattern's trigger is a distinct index, so trigger timestamps are unique.
        let mut by_trigger: HashMap<DateTime<Utc>, Signal> = signals
            .into_iter()
            .map(|signal| (signal.trigger_timestamp, signal))
            .collect();

        Ok(candles
            .iter()
            .zip(formed)
            .map(|(candle, formed)| {
                let signal = by_trigger.remove(&candle.timestamp());
                let commentary =
                    self.commentary
                        .describe(candle, signal.as_ref(), formed.as_ref());
                AnalysisRow {
                    candle: *candle,
                    signal,
                    formed,
                    commentary,
                }
            })
            .collect())
    }
}

/// Analyze `candles` with the default engine.
pub fn analyze(candles: &[Candle]) -> Result<Vec<AnalysisRow>> {
    SignalEngine::new().analyze(candles)
}

fn ensure_ordered(candles: &[Candle]) -> Result<()> {
    match candles
        .windows(2)
        .position(|pair| pair[1].timestamp() <= pair[0].timestamp())
    {
        Some(i) => Err(Error::UnorderedSequence { index: i + 1 }),
        None => Ok(()),
    }
}
