use analysis_core::SupportResistance;

/// Maximum number of levels kept on each side
pub const MAX_LEVELS: usize = 3;

/// Pivot points need two neighbours on each side
const PIVOT_REACH: usize = 2;

/// Swing lows and highs with 2-bar confirmation on both sides
pub fn find_pivots(closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut lows = Vec::new();
    let mut highs = Vec::new();

    if closes.len() < 2 * PIVOT_REACH + 1 {
        return (lows, highs);
    }

    for i in PIVOT_REACH..closes.len() - PIVOT_REACH {
        let value = closes[i];
        let neighbours = [closes[i - 2], closes[i - 1], closes[i + 1], closes[i + 2]];

        if neighbours.iter().all(|&n| value < n) {
            lows.push(value);
        }
        if neighbours.iter().all(|&n| value > n) {
            highs.push(value);
        }
    }

    (lows, highs)
}

/// Sort ascending and drop repeated values
fn distinct_ascending(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();
    values
}

/// Support and resistance levels from pivot points of a close series.
///
/// Supports are the three highest swing lows in descending order; resistances
/// are the three highest swing highs in ascending order.
pub fn find_levels(closes: &[f64]) -> SupportResistance {
    let (lows, highs) = find_pivots(closes);

    let mut support = distinct_ascending(lows);
    support.reverse();
    support.truncate(MAX_LEVELS);

    let highs = distinct_ascending(highs);
    let resistance = highs[highs.len().saturating_sub(MAX_LEVELS)..].to_vec();

    SupportResistance {
        strongest_support: support.first().copied().unwrap_or(0.0),
        strongest_resistance: resistance.last().copied().unwrap_or(0.0),
        support,
        resistance,
    }
}
