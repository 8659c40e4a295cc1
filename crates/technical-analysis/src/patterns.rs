use analysis_core::{Bar, Pattern, TrendDirection};

/// Number of trailing bars scanned for chart patterns
pub const PATTERN_WINDOW: usize = 20;

pub const DOUBLE_BOTTOM: &str = "Double Bottom";
pub const HEAD_AND_SHOULDERS: &str = "Head and Shoulders";

const DOUBLE_BOTTOM_MIN_SEPARATION: usize = 5;
const DOUBLE_BOTTOM_MAX_SPREAD: f64 = 0.02;
const SHOULDER_MAX_SPREAD: f64 = 0.05;

/// A local high inside the pattern window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub price: f64,
}

fn pattern_window(bars: &[Bar]) -> Option<&[Bar]> {
    if bars.len() < PATTERN_WINDOW {
        return None;
    }
    Some(&bars[bars.len() - PATTERN_WINDOW..])
}

/// Two lowest lows at least six bars apart and within 2% of each other
pub fn detect_double_bottom(bars: &[Bar]) -> Option<Pattern> {
    let window = pattern_window(bars)?;

    let mut by_low: Vec<(usize, f64)> = window.iter().map(|b| b.low).enumerate().collect();
    by_low.sort_by(|a, b| a.1.total_cmp(&b.1));

    let (first_idx, first_low) = by_low[0];
    let (second_idx, second_low) = by_low[1];

    let reference = first_low.min(second_low);
    if reference == 0.0 {
        return None;
    }

    let index_diff = first_idx.abs_diff(second_idx);
    let price_diff = (first_low - second_low).abs() / reference;

    if index_diff > DOUBLE_BOTTOM_MIN_SEPARATION && price_diff < DOUBLE_BOTTOM_MAX_SPREAD {
        let last_close = window[window.len() - 1].close;
        return Some(Pattern {
            name: DOUBLE_BOTTOM.to_string(),
            confidence: 0.8,
            implication: TrendDirection::Bullish,
            price_target: Some(last_close * 1.1),
        });
    }

    None
}

/// Bars whose high exceeds both immediate neighbours, in chronological order
pub fn find_peaks(bars: &[Bar]) -> Vec<Peak> {
    if bars.len() < 3 {
        return Vec::new();
    }

    (1..bars.len() - 1)
        .filter(|&i| bars[i].high > bars[i - 1].high && bars[i].high > bars[i + 1].high)
        .map(|i| Peak {
            index: i,
            price: bars[i].high,
        })
        .collect()
}

/// Three most recent peaks with a higher middle peak and shoulders within 5%
pub fn detect_head_and_shoulders(bars: &[Bar]) -> Option<Pattern> {
    let window = pattern_window(bars)?;

    let peaks = find_peaks(window);
    if peaks.len() < 3 {
        return None;
    }

    let recent = &peaks[peaks.len() - 3..];
    let (left, head, right) = (recent[0], recent[1], recent[2]);

    if left.price == 0.0 {
        return None;
    }

    let shoulder_spread = (left.price - right.price).abs() / left.price;

    if head.price > left.price && head.price > right.price && shoulder_spread < SHOULDER_MAX_SPREAD {
        let last_close = window[window.len() - 1].close;
        return Some(Pattern {
            name: HEAD_AND_SHOULDERS.to_string(),
            confidence: 0.7,
            implication: TrendDirection::Bearish,
            price_target: Some(last_close * 0.9),
        });
    }

    None
}

/// Detect all chart patterns, in the fixed order double bottom then head and shoulders
pub fn detect_patterns(bars: &[Bar]) -> Vec<Pattern> {
    let mut patterns = Vec::new();

    if let Some(p) = detect_double_bottom(bars) {
        patterns.push(p);
    }

    if let Some(p) = detect_head_and_shoulders(bars) {
        patterns.push(p);
    }

    patterns
}
