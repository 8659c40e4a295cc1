use analysis_core::{Bar, Indicators, MacdValue, MovingAverages};

use crate::candles::closes;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Neutral RSI reported when there are too few changes to smooth
pub const NEUTRAL_RSI: f64 = 50.0;

/// Simple Moving Average of the last `period` values.
///
/// Returns 0 when the data is shorter than the period.
pub fn sma(data: &[f64], period: usize) -> f64 {
    if period == 0 || data.len() < period {
        return 0.0;
    }

    let sum: f64 = data[data.len() - period..].iter().sum();
    sum / period as f64
}

/// Exponential Moving Average series, seeded with the first value.
///
/// When the data is shorter than the period the input is returned unchanged;
/// callers read the last element either way.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return data.to_vec();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    result.push(data[0]);

    for i in 1..data.len() {
        let prev = result[i - 1];
        result.push((data[i] - prev) * multiplier + prev);
    }

    result
}

/// Last EMA value, or 0 for empty input
pub fn ema_last(data: &[f64], period: usize) -> f64 {
    ema(data, period).last().copied().unwrap_or(0.0)
}

/// Relative Strength Index using Wilder's smoothing
pub fn rsi(data: &[f64], period: usize) -> f64 {
    if period == 0 || data.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
    }

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Full MACD computation, exposing the intermediate series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdResult {
    /// Fast EMA minus slow EMA at the last index
    pub macd_line: f64,
    /// Fast EMA minus slow EMA at every index
    pub history: Vec<f64>,
    /// EMA of `history`
    pub signal_line: Vec<f64>,
    /// `macd_line` minus the last signal value
    pub histogram: f64,
}

impl MacdResult {
    pub fn value(&self) -> MacdValue {
        MacdValue {
            value: self.macd_line,
            signal: self.signal_line.last().copied().unwrap_or(0.0),
            histogram: self.histogram,
        }
    }
}

pub fn macd_series(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    if data.is_empty() {
        return MacdResult::default();
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let history: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(fast, slow)| fast - slow)
        .collect();

    let macd_line = match (ema_fast.last(), ema_slow.last()) {
        (Some(fast), Some(slow)) => fast - slow,
        _ => 0.0,
    };

    let signal_line = ema(&history, signal_period);
    let histogram = macd_line - signal_line.last().copied().unwrap_or(0.0);

    MacdResult {
        macd_line,
        history,
        signal_line,
        histogram,
    }
}

/// MACD (12, 26, 9) over closes
pub fn macd(data: &[f64]) -> MacdValue {
    macd_series(data, MACD_FAST, MACD_SLOW, MACD_SIGNAL).value()
}

pub fn moving_averages(data: &[f64]) -> MovingAverages {
    MovingAverages {
        sma20: sma(data, 20),
        sma50: sma(data, 50),
        sma200: sma(data, 200),
        ema20: ema_last(data, 20),
    }
}

/// RSI, MACD and moving averages over the closes of `bars`
pub fn compute_indicators(bars: &[Bar]) -> Indicators {
    if bars.is_empty() {
        return Indicators::default();
    }

    let closes = closes(bars);
    Indicators {
        rsi: rsi(&closes, RSI_PERIOD),
        macd: macd(&closes),
        moving_averages: moving_averages(&closes),
    }
}
