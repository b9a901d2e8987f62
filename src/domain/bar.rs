//! OHLCV bar representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One batch of market data: bars per symbol, keyed by symbol.
pub type MarketData = BTreeMap<String, Vec<Bar>>;

/// One price bar. A series holds bars of a single symbol in ascending
/// timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Percent change of this close relative to `prev_close`.
    pub fn change_pct(&self, prev_close: f64) -> f64 {
        if prev_close == 0.0 {
            return 0.0;
        }
        (self.close / prev_close - 1.0) * 100.0
    }

    /// The first field that is not a usable market value, with its value.
    /// Prices must be finite and positive, volume finite and non-negative.
    pub fn invalid_field(&self) -> Option<(&'static str, f64)> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        if let Some(bad) = prices
            .into_iter()
            .find(|(_, v)| !(v.is_finite() && *v > 0.0))
        {
            return Some(bad);
        }
        if !(self.volume.is_finite() && self.volume >= 0.0) {
            return Some(("volume", self.volume));
        }
        None
    }
}

/// True when timestamps are strictly increasing.
pub fn is_ascending(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}
