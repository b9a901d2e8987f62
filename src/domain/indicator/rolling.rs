//! Fixed-window rolling statistics and gap filling.
//!
//! A window is defined only once it holds `period` defined values; earlier
//! positions are `None`.

/// Simple moving average over a fully defined input.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if period == 0 {
        out.resize(values.len(), None);
        return out;
    }
    for i in 0..values.len() {
        if i + 1 < period {
            out.push(None);
        } else {
            let window = &values[i + 1 - period..=i];
            out.push(Some(window.iter().sum::<f64>() / period as f64));
        }
    }
    out
}

/// Simple moving average over a series with warmup gaps. Any `None` inside
/// the window leaves that position undefined.
pub fn rolling_mean_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if period == 0 {
        out.resize(values.len(), None);
        return out;
    }
    for i in 0..values.len() {
        if i + 1 < period {
            out.push(None);
            continue;
        }
        let window = &values[i + 1 - period..=i];
        let sum: Option<f64> = window.iter().copied().sum();
        out.push(sum.map(|s| s / period as f64));
    }
    out
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::max)
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::min)
}

fn rolling_fold(values: &[f64], period: usize, f: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if period == 0 || i + 1 < period {
            out.push(None);
        } else {
            let window = &values[i + 1 - period..=i];
            out.push(window.iter().copied().reduce(f));
        }
    }
    out
}

/// Forward-fill, then back-fill the leading gap. A series with no defined
/// value at all becomes `fallback` everywhere.
pub fn fill_gaps(values: &[Option<f64>], fallback: f64) -> Vec<f64> {
    let first = values.iter().flatten().copied().next();
    let Some(first) = first else {
        return vec![fallback; values.len()];
    };

    let mut last = first;
    values
        .iter()
        .map(|v| {
            if let Some(x) = v {
                last = *x;
            }
            last
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_warmup_and_values() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((out[3].unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mean_period_zero_is_undefined() {
        assert!(rolling_mean(&[1.0, 2.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn mean_opt_requires_full_window() {
        let input = [None, Some(2.0), Some(4.0), Some(6.0)];
        let out = rolling_mean_opt(&input, 2);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap() - 3.0).abs() < f64::EPSILON);
        assert!((out[3].unwrap() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn max_and_min() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        let max = rolling_max(&values, 3);
        let min = rolling_min(&values, 3);
        assert_eq!(max, vec![None, None, Some(4.0), Some(4.0), Some(5.0)]);
        assert_eq!(min, vec![None, None, Some(1.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn fill_forward_then_back() {
        let out = fill_gaps(&[None, None, Some(2.0), None, Some(5.0), None], 0.0);
        assert_eq!(out, vec![2.0, 2.0, 2.0, 2.0, 5.0, 5.0]);
    }

    #[test]
    fn fill_all_missing_uses_fallback() {
        assert_eq!(fill_gaps(&[None, None], 1.0), vec![1.0, 1.0]);
        assert!(fill_gaps(&[], 1.0).is_empty());
    }
}
