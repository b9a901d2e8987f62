//! MACD (Moving Average Convergence Divergence) with crossover events.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Crossovers are edge-triggered:
//! cross_up[i]   = line[i] > signal[i] && line[i-1] <= signal[i-1]
//! cross_down[i] = line[i] < signal[i] && line[i-1] >= signal[i-1]
//! Bar 0 never crosses.

use crate::domain::bar::Bar;
use crate::domain::indicator::ema::calculate_ema;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
    pub cross_up: Vec<bool>,
    pub cross_down: Vec<bool>,
}

pub fn calculate_macd(bars: &[Bar], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries::default();
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = calculate_ema(&closes, fast);
    let ema_slow = calculate_ema(&closes, slow);

    let line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal = calculate_ema(&line, signal_period);
    let histogram: Vec<f64> = line.iter().zip(signal.iter()).map(|(l, s)| l - s).collect();

    let mut cross_up = vec![false; bars.len()];
    let mut cross_down = vec![false; bars.len()];
    for i in 1..bars.len() {
        cross_up[i] = line[i] > signal[i] && line[i - 1] <= signal[i - 1];
        cross_down[i] = line[i] < signal[i] && line[i - 1] >= signal[i - 1];
    }

    MacdSeries {
        line,
        signal,
        histogram,
        cross_up,
        cross_down,
    }
}
