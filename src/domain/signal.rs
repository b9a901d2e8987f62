//! Entry rules and candidate scoring for a single symbol.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::params::{EntryMode, ScoreWeights, SymbolParameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for long exposure, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// A scored entry candidate. Lives for one scan cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub symbol: String,
    pub direction: Direction,
    pub score: f64,
    pub entry_price: f64,
    pub indicators: IndicatorSnapshot,
}

/// Every leg of the entry rule, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntrySignals {
    pub rsi_buy: bool,
    pub rsi_sell: bool,
    pub macd_buy: bool,
    pub macd_sell: bool,
    pub volume_buy: bool,
    pub volume_sell: bool,
    pub high_volatility: bool,
    pub buy: bool,
    pub sell: bool,
}

impl EntrySignals {
    pub fn direction(&self) -> Option<Direction> {
        if self.buy {
            Some(Direction::Buy)
        } else if self.sell {
            Some(Direction::Sell)
        } else {
            None
        }
    }
}

/// Evaluate the entry rule on one snapshot (normally the latest bar).
pub fn evaluate_entry(
    snapshot: &IndicatorSnapshot,
    params: &SymbolParameters,
    mode: EntryMode,
) -> EntrySignals {
    let rsi_buy = snapshot.rsi_real <= params.rsi_oversold;
    let rsi_sell = snapshot.rsi_real >= params.rsi_overbought;
    let macd_buy = snapshot.macd_cross_up;
    let macd_sell = snapshot.macd_cross_down;

    let high_volume = snapshot.volume_ratio >= params.volume_threshold;
    let volume_buy = high_volume && snapshot.volume_confirms_buy;
    let volume_sell = high_volume && snapshot.volume_confirms_sell;
    let high_volatility = snapshot.atr_ratio >= params.atr_multiplier;

    let (buy, sell) = match mode {
        EntryMode::Strict => (
            rsi_buy && macd_buy && volume_buy && high_volatility,
            rsi_sell && macd_sell && volume_sell && high_volatility,
        ),
        EntryMode::Loose => (rsi_buy && macd_buy, rsi_sell && macd_sell),
    };

    EntrySignals {
        rsi_buy,
        rsi_sell,
        macd_buy,
        macd_sell,
        volume_buy,
        volume_sell,
        high_volatility,
        buy,
        sell,
    }
}

/// Normalised score components, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreComponents {
    pub rsi: f64,
    pub macd: f64,
    pub volume: f64,
}

pub fn score_components(
    snapshot: &IndicatorSnapshot,
    params: &SymbolParameters,
    direction: Direction,
) -> ScoreComponents {
    let rsi = match direction {
        Direction::Buy => ratio_or_one(params.rsi_oversold - snapshot.rsi_real, params.rsi_oversold),
        Direction::Sell => ratio_or_one(
            snapshot.rsi_real - params.rsi_overbought,
            100.0 - params.rsi_overbought,
        ),
    };

    let macd = if snapshot.atr > 0.0 {
        (snapshot.macd_histogram.abs() / snapshot.atr).min(1.0)
    } else {
        0.0
    };

    let volume = (snapshot.volume_ratio - 1.0).clamp(0.0, 1.0);

    ScoreComponents {
        rsi: rsi.clamp(0.0, 1.0),
        macd,
        volume,
    }
}

/// Weighted score on a 0..=100 scale.
pub fn score_candidate(
    snapshot: &IndicatorSnapshot,
    params: &SymbolParameters,
    direction: Direction,
    weights: &ScoreWeights,
) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }
    let c = score_components(snapshot, params, direction);
    100.0 * (weights.rsi * c.rsi + weights.macd * c.macd + weights.volume * c.volume) / total
}

fn ratio_or_one(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        1.0
    } else {
        numerator / denominator
    }
}
