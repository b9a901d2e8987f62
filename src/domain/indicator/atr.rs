//! Average True Range and the ATR expansion ratio.
//!
//! TR[0] = high - low, TR[i] = max(h - l, |h - C[i-1]|, |l - C[i-1]|)
//! ATR   = SMA(TR, n)
//! ratio = ATR / SMA(ATR, m), 1.0 where either average is undefined

use crate::domain::bar::Bar;
use crate::domain::indicator::rolling::{rolling_mean, rolling_mean_opt};

pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_ranges(bars), period)
}

/// ATR relative to its own moving average. Returns the average alongside.
pub fn calculate_atr_ratio(atr: &[Option<f64>], ma_period: usize) -> (Vec<Option<f64>>, Vec<f64>) {
    let atr_ma = rolling_mean_opt(atr, ma_period);
    let ratio = atr
        .iter()
        .zip(atr_ma.iter())
        .map(|(a, ma)| match (a, ma) {
            (Some(a), Some(ma)) if *ma > 0.0 => (a / ma).max(0.0),
            _ => 1.0,
        })
        .collect();
    (atr_ma, ratio)
}
