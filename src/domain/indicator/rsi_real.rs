//! RSI Real: where the close sits inside the recent high/low range.
//!
//! RSI_REAL = (C - LL(n)) / (HH(n) - LL(n)) * 100
//!
//! HH/LL are the highest high and lowest low over the last n bars. A zero
//! range uses a denominator of 1. This is a price-location oscillator, not
//! Wilder's RSI.
//!
//! Warmup: first (n-1) bars are undefined.

use crate::domain::bar::Bar;
use crate::domain::indicator::rolling::{rolling_max, rolling_min};

pub fn calculate_rsi_real(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let highest = rolling_max(&highs, window);
    let lowest = rolling_min(&lows, window);

    bars.iter()
        .zip(highest.iter().zip(lowest.iter()))
        .map(|(bar, (hh, ll))| match (hh, ll) {
            (Some(hh), Some(ll)) => {
                let mut range = hh - ll;
                if range == 0.0 {
                    range = 1.0;
                }
                Some(((bar.close - ll) / range * 100.0).clamp(0.0, 100.0))
            }
            _ => None,
        })
        .collect()
}
