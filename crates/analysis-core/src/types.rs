use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw price observation as delivered by the price feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix timestamp in seconds
    pub timestamp: i64,
    pub value: f64,
}

impl PricePoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// OHLCV bar derived from two consecutive price points.
///
/// The feed carries no intrabar data, so `high`/`low` are the max/min of
/// `open` and `close` and `volume` is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Timeframes requested from the price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "1H")]
    Hour1,
    #[serde(rename = "4H")]
    Hour4,
}

impl Timeframe {
    /// Identifier understood by the price feed
    pub fn feed_id(&self) -> &'static str {
        match self {
            Timeframe::Minute15 => "15m",
            Timeframe::Hour1 => "1H",
            Timeframe::Hour4 => "4H",
        }
    }

    pub fn to_minutes(&self) -> i64 {
        match self {
            Timeframe::Minute15 => 15,
            Timeframe::Hour1 => 60,
            Timeframe::Hour4 => 240,
        }
    }

    /// All timeframes in the order they are fetched and checked
    pub fn all() -> [Timeframe; 3] {
        [Timeframe::Minute15, Timeframe::Hour1, Timeframe::Hour4]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.feed_id())
    }
}

/// Direction shared by trend classification and pattern implication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Bullish => "bullish",
            TrendDirection::Bearish => "bearish",
            TrendDirection::Neutral => "neutral",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub value: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovingAverages {
    pub sma20: f64,
    pub sma50: f64,
    pub sma200: f64,
    pub ema20: f64,
}

/// Indicator snapshot for the 1-hour series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicators {
    /// 0 to 100
    pub rsi: f64,
    pub macd: MacdValue,
    pub moving_averages: MovingAverages,
}

impl Default for Indicators {
    fn default() -> Self {
        Self {
            rsi: 50.0,
            macd: MacdValue::default(),
            moving_averages: MovingAverages::default(),
        }
    }
}

/// Detected chart pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub name: String,
    pub confidence: f64, // 0.0 to 1.0
    pub implication: TrendDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_target: Option<f64>,
}

/// Pivot-derived price levels.
///
/// `support` is sorted descending, `resistance` ascending; both hold at most
/// three distinct values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResistance {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
    pub strongest_support: f64,
    pub strongest_resistance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub short_term: TrendDirection,
    pub medium_term: TrendDirection,
    pub confidence: f64, // 0.0 to 1.0
    pub reasoning: String,
}

/// Volume analysis needs real intrabar volume, which the feed does not carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeAnalysis {
    Unavailable,
}

/// Full technical report for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub patterns: Vec<Pattern>,
    pub indicators: Indicators,
    pub support_resistance: SupportResistance,
    pub trend: TrendResult,
    pub volume_analysis: VolumeAnalysis,
}

pub const INSUFFICIENT_DATA_REASONING: &str = "Insufficient data for analysis";

impl AnalysisReport {
    /// Report returned whenever any timeframe has no bars
    pub fn insufficient_data() -> Self {
        Self {
            patterns: Vec::new(),
            indicators: Indicators::default(),
            support_resistance: SupportResistance::default(),
            trend: TrendResult {
                short_term: TrendDirection::Neutral,
                medium_term: TrendDirection::Neutral,
                confidence: 0.0,
                reasoning: INSUFFICIENT_DATA_REASONING.to_string(),
            },
            volume_analysis: VolumeAnalysis::Unavailable,
        }
    }
}

/// Bar sequences for the three timeframes of one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeframeBars {
    pub minute15: Vec<Bar>,
    pub hour1: Vec<Bar>,
    pub hour4: Vec<Bar>,
}

impl TimeframeBars {
    pub fn get(&self, timeframe: Timeframe) -> &[Bar] {
        match timeframe {
            Timeframe::Minute15 => &self.minute15,
            Timeframe::Hour1 => &self.hour1,
            Timeframe::Hour4 => &self.hour4,
        }
    }

    /// First timeframe, in fetch order, that has no bars
    pub fn first_empty(&self) -> Option<Timeframe> {
        Timeframe::all()
            .into_iter()
            .find(|tf| self.get(*tf).is_empty())
    }
}
