//! Exponential Moving Average.
//!
//! k = 2/(n+1), EMA[0] = X[0], then EMA[i] = X[i]*k + EMA[i-1]*(1-k).
//! The recursion starts at the first value, so there is no warmup gap.

pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);

    for &x in &values[1..] {
        ema = x * k + ema * (1.0 - k);
        out.push(ema);
    }

    out
}
