//! OBV (On-Balance Volume) and its trend.

use crate::domain::bar::Bar;
use crate::domain::indicator::rolling::rolling_mean;

/// Calculate OBV (On-Balance Volume).
///
/// OBV[0] = 0
/// If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
/// If close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
/// If close[i] == close[i-1]: OBV[i] = OBV[i-1]
///
/// No warmup period.
pub fn calculate_obv(bars: &[Bar]) -> Vec<f64> {
    let mut values = Vec::with_capacity(bars.len());
    let mut obv: f64 = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let prev_close = bars[i - 1].close;
            if bar.close > prev_close {
                obv += bar.volume;
            } else if bar.close < prev_close {
                obv -= bar.volume;
            }
        }
        values.push(obv);
    }

    values
}

/// +1 where OBV is above its own `period` moving average, otherwise -1
/// (including the warmup bars where the average is undefined).
pub fn calculate_obv_trend(obv: &[f64], period: usize) -> (Vec<Option<f64>>, Vec<i8>) {
    let obv_ma = rolling_mean(obv, period);
    let trend = obv
        .iter()
        .zip(obv_ma.iter())
        .map(|(value, ma)| match ma {
            Some(ma) if value > ma => 1,
            _ => -1,
        })
        .collect();
    (obv_ma, trend)
}
