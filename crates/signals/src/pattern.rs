use common::{Candle, Pattern, PatternKind};

/// Engulfing pattern detector.
///
/// Scans adjacent pairs `(i, i + 1)` of an ordered candle sequence. Each pair is
/// judged on its own, so one candle can be the second candle of one pattern and
/// the first candle of the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternDetector;

impl PatternDetector {
    pub fn new() -> Self {
        Self
    }

    /// Lazily yield every engulfing pattern in `candles`, oldest first.
    /// Sequences shorter than two candles yield nothing.
    pub fn detect<'a>(&self, candles: &'a [Candle]) -> impl Iterator<Item = Pattern> + 'a {
        candles.windows(2).enumerate().filter_map(|(i, pair)| {
            let (prior, current) = (&pair[0], &pair[1]);
            classify(prior, current).map(|kind| Pattern {
                kind,
                prior: *prior,
                current: *current,
                current_index: i + 1,
                confidence: engulfment_confidence(prior, current),
            })
        })
    }
}

/// Classify one adjacent pair. Body engulfment is strict on both ends; a doji on
/// either side never qualifies.
pub fn classify(prior: &Candle, current: &Candle) -> Option<PatternKind> {
    if prior.is_bearish()
        && current.is_bullish()
        && current.open() < prior.close()
        && current.close() > prior.open()
    {
        Some(PatternKind::BullishEngulfing)
    } else if prior.is_bullish()
        && current.is_bearish()
        && current.open() > prior.close()
        && current.close() < prior.open()
    {
        Some(PatternKind::BearishEngulfing)
    } else {
        None
    }
}

/// `1 - prior_body / current_body`, clamped to [0, 1].
///
/// A qualifying pair always has `current_body > prior_body > 0`, so the score
/// is strictly increasing in how many times the engulfing body covers the
/// engulfed one: a barely-covering body scores near 0, a deep one near 1.
pub fn engulfment_confidence(prior: &Candle, current: &Candle) -> f64 {
    let current_body = current.body_size();
    if current_body <= 0.0 {
        return 0.0;
    }
    (1.0 - prior.body_size() / current_body).clamp(0.0, 1.0)
}
