use std::fmt::Write;

use common::{AnalysisRow, MarketData, SignalTag};
use signals::{AnalysisStats, SignalSummary};

// ─── Table ───────────────────────────────────────────────────────────────────

fn tag_label(tag: SignalTag) -> &'static str {
    match tag {
        SignalTag::GoLong => "▲ GO LONG",
        SignalTag::GoShort => "▼ GO SHORT",
        SignalTag::None => "·",
    }
}

/// Render the most recent `limit` rows as a fixed-width table.
pub fn render_table(rows: &[AnalysisRow], limit: usize) -> String {
    let shown = &rows[rows.len().saturating_sub(limit)..];
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<10}  {:>12}  {:>12}  {:>12}  {:>12}  {:>14}  {:<10}  {:>10}  Commentary",
        "Date", "Open", "High", "Low", "Close", "Volume", "Signal", "Confidence"
    );
    let _ = writeln!(out, "{}", "─".repeat(120));

    for row in shown {
        let c = &row.candle;
        let volume = c
            .volume()
            .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        let confidence = row
            .signal
            .as_ref()
            .map_or_else(|| "-".to_string(), |s| format!("{:.1}%", s.confidence * 100.0));
        let _ = writeln!(
            out,
            "{:<10}  {:>12.2}  {:>12.2}  {:>12.2}  {:>12.2}  {:>14}  {:<10}  {:>10}  {}",
            c.timestamp().format("%Y-%m-%d"),
            c.open(),
            c.high(),
            c.low(),
            c.close(),
            volume,
            tag_label(row.tag()),
            confidence,
            row.commentary
        );
    }
    out
}

// ─── Summary ─────────────────────────────────────────────────────────────────

pub fn render_summary(data: &MarketData, rows: &[AnalysisRow]) -> String {
    let stats = AnalysisStats::from_rows(rows);
    let summary = SignalSummary::from_signals(rows.iter().filter_map(|r| r.signal.as_ref()));
    let mut out = String::new();

    let _ = writeln!(out, "{} {} summary", data.symbol, data.interval);
    if let (Some(first), Some(last)) = (data.candles.first(), data.latest_candle()) {
        let _ = writeln!(
            out,
            "  Range:            {} → {}",
            first.timestamp().format("%Y-%m-%d"),
            last.timestamp().format("%Y-%m-%d")
        );
    }
    let _ = writeln!(out, "  Candles analyzed: {}", stats.candles_analyzed);
    let _ = writeln!(
        out,
        "  Patterns:         {} ({:.1}% of candles, {} awaiting trigger)",
        stats.patterns_detected,
        stats.pattern_detection_rate() * 100.0,
        stats.unconfirmed_patterns
    );
    let _ = writeln!(
        out,
        "  Signals:          {} ({} long, {} short; {:.1}% of patterns)",
        summary.total_signals,
        summary.long_signals,
        summary.short_signals,
        stats.signal_generation_rate() * 100.0
    );
    if summary.total_signals > 0 {
        let _ = writeln!(
            out,
            "  Avg confidence:   {:.1}%",
            summary.avg_confidence * 100.0
        );
        for (level, count) in &summary.confidence_distribution {
            let _ = writeln!(out, "    {:<10} {count}", level.strength());
        }
    }
    if let Some(latest) = summary.latest_trigger {
        let _ = writeln!(out, "  Latest signal:    {}", latest.format("%Y-%m-%d"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use common::{Candle, Interval};

    fn week(n: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::weeks(n);
        Candle::new(ts, open, high, low, close, None).unwrap()
    }

    fn bearish_data() -> (MarketData, Vec<AnalysisRow>) {
        let candles = vec![
            week(0, 80.0, 92.0, 78.0, 90.0),
            week(1, 92.0, 95.0, 75.0, 78.0),
            week(2, 83.0, 86.0, 80.0, 81.0),
        ];
        let rows = signals::analyze(&candles).unwrap();
        let data = MarketData {
            symbol: "BTCUSDT".into(),
            interval: Interval::OneWeek,
            candles,
            last_updated: Utc::now(),
        };
        (data, rows)
    }

    #[test]
    fn table_shows_only_the_latest_rows() {
        let (_, rows) = bearish_data();
        let table = render_table(&rows, 2);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Date"));
        assert!(lines[2].starts_with("2024-01-08"));
        assert!(lines[3].contains("▼ GO SHORT"));
        assert!(lines[3].contains("83.00"));
    }

    #[test]
    fn table_marks_rows_without_signal() {
        let (_, rows) = bearish_data();
        let table = render_table(&rows, 10);
        let first = table.lines().nth(2).unwrap();
        assert!(first.contains(" · "));
        assert!(first.contains("No actionable pattern"));
    }

    #[test]
    fn summary_reports_counts() {
        let (data, rows) = bearish_data();
        let summary = render_summary(&data, &rows);

        assert!(summary.starts_with("BTCUSDT 1w summary"));
        assert!(summary.contains("Candles analyzed: 3"));
        assert!(summary.contains("Signals:          1 (0 long, 1 short; 100.0% of patterns)"));
        assert!(summary.contains("Latest signal:    2024-01-15"));
    }
}
