use analysis_core::{Bar, PricePoint};

/// Build bars from consecutive price points.
///
/// Each bar opens at the previous point and closes at the current one, so a
/// series of `n` points yields `n - 1` bars and fewer than two points yield
/// none.
pub fn build_bars(points: &[PricePoint]) -> Vec<Bar> {
    points
        .windows(2)
        .map(|pair| {
            let open = pair[0].value;
            let close = pair[1].value;
            Bar {
                timestamp: pair[1].timestamp,
                open,
                high: open.max(close),
                low: open.min(close),
                close,
                volume: 0.0,
            }
        })
        .collect()
}

/// Close prices of a bar sequence
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
