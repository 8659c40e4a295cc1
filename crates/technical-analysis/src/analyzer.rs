use analysis_core::{AnalysisReport, PricePoint, TimeframeBars, VolumeAnalysis};

use crate::candles::{build_bars, closes};
use crate::indicators::compute_indicators;
use crate::levels::find_levels;
use crate::patterns::detect_patterns;
use crate::trend::analyze_trend;

/// Pure report builder over already-fetched bar sequences.
///
/// Holds no state, so one engine can serve any number of concurrent requests.
pub struct TechnicalAnalysisEngine;

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    /// Build bars for all three timeframes from raw feed points
    pub fn build_timeframe_bars(
        &self,
        minute15: &[PricePoint],
        hour1: &[PricePoint],
        hour4: &[PricePoint],
    ) -> TimeframeBars {
        TimeframeBars {
            minute15: build_bars(minute15),
            hour1: build_bars(hour1),
            hour4: build_bars(hour4),
        }
    }

    /// Assemble the full report.
    ///
    /// Indicators, levels and patterns come from the 1-hour series; the trend
    /// reads all three. Any empty sequence yields the default report.
    pub fn analyze(&self, bars: &TimeframeBars) -> AnalysisReport {
        if bars.first_empty().is_some() {
            return AnalysisReport::insufficient_data();
        }

        let indicators = compute_indicators(&bars.hour1);
        let support_resistance = find_levels(&closes(&bars.hour1));
        let patterns = detect_patterns(&bars.hour1);
        let trend = analyze_trend(bars, indicators);

        AnalysisReport {
            patterns,
            indicators,
            support_resistance,
            trend,
            volume_analysis: VolumeAnalysis::Unavailable,
        }
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
