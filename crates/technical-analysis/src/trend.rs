use analysis_core::{Bar, Indicators, TimeframeBars, TrendDirection, TrendResult};

use crate::indicators::sma;
use crate::candles::closes;

pub const SHORT_TERM_PERIOD: usize = 20;
pub const MEDIUM_TERM_PERIOD: usize = 50;
pub const LONG_TERM_PERIOD: usize = 50;

/// Percent move over the period needed to call a trend
const TREND_THRESHOLD_PCT: f64 = 1.0;

const SIGNAL_WEIGHT: f64 = 0.2;
const ALIGNMENT_WEIGHT: f64 = 0.1;

/// Classify a bar series as bullish, bearish or neutral over `period` bars.
///
/// Bullish requires the last close above the period SMA and a gain of more
/// than 1% since the start of the period; bearish is the mirror image.
pub fn classify_trend(bars: &[Bar], period: usize) -> TrendDirection {
    if period == 0 || bars.len() < period {
        return TrendDirection::Neutral;
    }

    let closes = closes(bars);
    let last_close = closes[closes.len() - 1];
    let base = closes[closes.len() - period];
    if base == 0.0 {
        return TrendDirection::Neutral;
    }

    let average = sma(&closes, period);
    let pct_change = (last_close - base) / base * 100.0;

    if last_close > average && pct_change > TREND_THRESHOLD_PCT {
        TrendDirection::Bullish
    } else if last_close < average && pct_change < -TREND_THRESHOLD_PCT {
        TrendDirection::Bearish
    } else {
        TrendDirection::Neutral
    }
}

/// Everything the confidence score and the reasoning clauses read
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSignals {
    pub short_term: TrendDirection,
    pub medium_term: TrendDirection,
    pub long_term: TrendDirection,
    pub indicators: Indicators,
}

impl TrendSignals {
    pub fn from_bars(bars: &TimeframeBars, indicators: Indicators) -> Self {
        Self {
            short_term: classify_trend(&bars.minute15, SHORT_TERM_PERIOD),
            medium_term: classify_trend(&bars.hour1, MEDIUM_TERM_PERIOD),
            long_term: classify_trend(&bars.hour4, LONG_TERM_PERIOD),
            indicators,
        }
    }

    fn rsi_extreme(&self) -> bool {
        self.indicators.rsi > 70.0 || self.indicators.rsi < 30.0
    }

    fn macd_momentum(&self) -> bool {
        self.indicators.macd.histogram.abs() > self.indicators.macd.signal.abs()
    }
}

/// Composite confidence from indicator confluence and timeframe agreement, capped at 1
pub fn trend_confidence(signals: &TrendSignals) -> f64 {
    let ma = &signals.indicators.moving_averages;
    let mut confidence = 0.0;

    if signals.rsi_extreme() {
        confidence += SIGNAL_WEIGHT;
    }
    if signals.macd_momentum() {
        confidence += SIGNAL_WEIGHT;
    }
    if ma.sma20 > ma.sma50 {
        confidence += SIGNAL_WEIGHT;
    }
    if ma.sma50 > ma.sma200 {
        confidence += SIGNAL_WEIGHT;
    }
    if signals.short_term == signals.medium_term {
        confidence += ALIGNMENT_WEIGHT;
    }
    if signals.medium_term == signals.long_term {
        confidence += ALIGNMENT_WEIGHT;
    }

    f64::min(confidence, 1.0)
}

/// One sentence of the trend explanation; `None` when the signal did not fire
pub type ReasoningClause = fn(&TrendSignals) -> Option<String>;

pub fn alignment_clause(signals: &TrendSignals) -> Option<String> {
    if signals.short_term == signals.medium_term {
        Some(format!(
            "Short-term and medium-term trends are aligned ({}).",
            signals.short_term
        ))
    } else {
        Some(format!(
            "Short-term trend is {} while medium-term trend is {}.",
            signals.short_term, signals.medium_term
        ))
    }
}

pub fn rsi_clause(signals: &TrendSignals) -> Option<String> {
    let rsi = signals.indicators.rsi;
    if rsi > 70.0 {
        Some(format!("RSI at {:.1} indicates overbought conditions.", rsi))
    } else if rsi < 30.0 {
        Some(format!("RSI at {:.1} indicates oversold conditions.", rsi))
    } else {
        None
    }
}

pub fn macd_clause(signals: &TrendSignals) -> Option<String> {
    if !signals.macd_momentum() {
        return None;
    }

    let histogram = signals.indicators.macd.histogram;
    if histogram > 0.0 {
        Some("MACD histogram shows strengthening bullish momentum.".to_string())
    } else if histogram < 0.0 {
        Some("MACD histogram shows strengthening bearish momentum.".to_string())
    } else {
        None
    }
}

pub fn moving_average_clause(signals: &TrendSignals) -> Option<String> {
    let ma = &signals.indicators.moving_averages;
    let text = if ma.sma20 > ma.sma50 && ma.sma50 > ma.sma200 {
        "Moving averages are stacked bullishly (SMA20 > SMA50 > SMA200)."
    } else if ma.sma20 < ma.sma50 && ma.sma50 < ma.sma200 {
        "Moving averages are stacked bearishly (SMA20 < SMA50 < SMA200)."
    } else {
        "Moving averages are mixed with no clear alignment."
    };
    Some(text.to_string())
}

/// Clauses in the order they appear in the reasoning text
pub const REASONING_CLAUSES: [ReasoningClause; 4] =
    [alignment_clause, rsi_clause, macd_clause, moving_average_clause];

pub fn build_reasoning(signals: &TrendSignals) -> String {
    REASONING_CLAUSES
        .iter()
        .filter_map(|clause| clause(signals))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Short/medium-term trend with composite confidence and explanation
pub fn analyze_trend(bars: &TimeframeBars, indicators: Indicators) -> TrendResult {
    let signals = TrendSignals::from_bars(bars, indicators);

    TrendResult {
        short_term: signals.short_term,
        medium_term: signals.medium_term,
        confidence: trend_confidence(&signals),
        reasoning: build_reasoning(&signals),
    }
}
