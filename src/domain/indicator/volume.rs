//! Volume ratio, volume direction and the combined volume confirmation.
//!
//! ratio     = volume / SMA(volume, n), 1.0 where the average is undefined
//! direction = +1 on a spike (volume > 1.1 x average) with close up > 0.1%,
//!             -1 on a spike with close down > 0.1%, else 0
//! confirms_buy  = ratio > 1.1 && obv_trend > 0 && direction > 0
//! confirms_sell = ratio > 1.1 && obv_trend < 0 && direction < 0

use crate::domain::bar::Bar;
use crate::domain::indicator::rolling::rolling_mean;

/// Volume must exceed its average by this factor to count as a spike.
pub const VOLUME_SPIKE_RATIO: f64 = 1.1;
/// Minimum same-bar close move, in percent, that accompanies a spike.
pub const PRICE_MOVE_PCT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VolumeSeries {
    pub volume_ma: Vec<Option<f64>>,
    pub ratio: Vec<f64>,
    pub price_change_pct: Vec<f64>,
    pub direction: Vec<i8>,
    pub confirms_buy: Vec<bool>,
    pub confirms_sell: Vec<bool>,
}

pub fn calculate_volume(bars: &[Bar], ma_period: usize, obv_trend: &[i8]) -> VolumeSeries {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let volume_ma = rolling_mean(&volumes, ma_period);

    let mut ratio = Vec::with_capacity(bars.len());
    let mut price_change_pct = Vec::with_capacity(bars.len());
    let mut direction = Vec::with_capacity(bars.len());
    let mut confirms_buy = Vec::with_capacity(bars.len());
    let mut confirms_sell = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let r = match volume_ma[i] {
            Some(ma) if ma > 0.0 => bar.volume / ma,
            _ => 1.0,
        };
        let change = if i == 0 {
            0.0
        } else {
            bar.change_pct(bars[i - 1].close)
        };

        let spike = matches!(volume_ma[i], Some(ma) if bar.volume > ma * VOLUME_SPIKE_RATIO);
        let dir: i8 = if spike && change > PRICE_MOVE_PCT {
            1
        } else if spike && change < -PRICE_MOVE_PCT {
            -1
        } else {
            0
        };

        let trend = obv_trend.get(i).copied().unwrap_or(-1);
        let strong = r > VOLUME_SPIKE_RATIO;

        ratio.push(r);
        price_change_pct.push(change);
        direction.push(dir);
        confirms_buy.push(strong && trend > 0 && dir > 0);
        confirms_sell.push(strong && trend < 0 && dir < 0);
    }

    VolumeSeries {
        volume_ma,
        ratio,
        price_change_pct,
        direction,
        confirms_buy,
        confirms_sell,
    }
}
