//! Indicator engine.
//!
//! [`compute_indicators`] turns a bar series into one [`IndicatorSnapshot`]
//! per bar. It is a pure function of its inputs: the same bars and
//! parameters always produce bit-identical output. Warmup gaps of the
//! windowed series are forward-filled then back-filled, so every snapshot is
//! fully populated.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rolling;
pub mod rsi_real;
pub mod volume;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::bar::Bar;
use crate::domain::error::TraderError;
use crate::domain::params::SymbolParameters;

use self::atr::{calculate_atr, calculate_atr_ratio};
use self::macd::calculate_macd;
use self::obv::{calculate_obv, calculate_obv_trend};
use self::rolling::fill_gaps;
use self::rsi_real::calculate_rsi_real;
use self::volume::calculate_volume;

/// Derived values for a single bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub rsi_real: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub macd_cross_up: bool,
    pub macd_cross_down: bool,
    pub volume_ma: f64,
    pub volume_ratio: f64,
    pub obv: f64,
    pub obv_ma: f64,
    pub obv_trend: i8,
    pub price_change_pct: f64,
    pub volume_direction: i8,
    pub volume_confirms_buy: bool,
    pub volume_confirms_sell: bool,
    pub atr: f64,
    pub atr_ma: f64,
    pub atr_ratio: f64,
}

/// Compute every indicator for `bars`.
///
/// Fails with [`TraderError::InsufficientData`] when the series is shorter
/// than the longest configured window; callers skip the symbol for the cycle.
/// A zero window is a [`TraderError::ConfigInvalid`], and a bar with a
/// non-finite or non-positive price (or a bad volume) is a
/// [`TraderError::Data`].
pub fn compute_indicators(
    symbol: &str,
    bars: &[Bar],
    params: &SymbolParameters,
) -> Result<Vec<IndicatorSnapshot>, TraderError> {
    if let Some((key, _)) = params.windows().into_iter().find(|(_, w)| *w == 0) {
        return Err(TraderError::config_invalid(
            symbol,
            key,
            "window must be at least 1",
        ));
    }

    let minimum = params.min_bars();
    if bars.len() < minimum {
        return Err(TraderError::InsufficientData {
            symbol: symbol.to_string(),
            bars: bars.len(),
            minimum,
        });
    }

    if let Some((index, (field, value))) = bars
        .iter()
        .enumerate()
        .find_map(|(i, bar)| bar.invalid_field().map(|bad| (i, bad)))
    {
        return Err(TraderError::Data {
            reason: format!("{symbol}: bar {index} has invalid {field} {value}"),
        });
    }

    let rsi_real = fill_gaps(&calculate_rsi_real(bars, params.rsi_window), 50.0);
    let macd = calculate_macd(bars, params.macd_fast, params.macd_slow, params.macd_signal);

    let obv = calculate_obv(bars);
    let (obv_ma, obv_trend) = calculate_obv_trend(&obv, params.obv_period);
    let obv_ma = fill_gaps(&obv_ma, 0.0);

    let volume = calculate_volume(bars, params.volume_ma_period, &obv_trend);
    let volume_ma = fill_gaps(&volume.volume_ma, 0.0);

    let atr_raw = calculate_atr(bars, params.atr_period);
    let (atr_ma, atr_ratio) = calculate_atr_ratio(&atr_raw, params.atr_ma_period);
    let atr = fill_gaps(&atr_raw, 0.0);
    let atr_ma = fill_gaps(&atr_ma, 0.0);

    let snapshots = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorSnapshot {
            timestamp: bar.timestamp,
            close: bar.close,
            rsi_real: rsi_real[i],
            macd: macd.line[i],
            macd_signal: macd.signal[i],
            macd_histogram: macd.histogram[i],
            macd_cross_up: macd.cross_up[i],
            macd_cross_down: macd.cross_down[i],
            volume_ma: volume_ma[i],
            volume_ratio: volume.ratio[i],
            obv: obv[i],
            obv_ma: obv_ma[i],
            obv_trend: obv_trend[i],
            price_change_pct: volume.price_change_pct[i],
            volume_direction: volume.direction[i],
            volume_confirms_buy: volume.confirms_buy[i],
            volume_confirms_sell: volume.confirms_sell[i],
            atr: atr[i],
            atr_ma: atr_ma[i],
            atr_ratio: atr_ratio[i],
        })
        .collect();

    tracing::trace!(symbol, bars = bars.len(), "indicators computed");
    Ok(snapshots)
}
