//! Per-symbol thresholds and engine-wide settings.
//!
//! These records are built once by [`crate::domain::config_validation`] and
//! passed by reference into the scanner and position book. Nothing mutates
//! them during a cycle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Thresholds and windows for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolParameters {
    pub rsi_window: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,

    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    pub volume_ma_period: usize,
    pub obv_period: usize,
    pub volume_threshold: f64,

    pub atr_period: usize,
    pub atr_ma_period: usize,
    /// Minimum ATR ratio for an entry.
    pub atr_multiplier: f64,

    pub stop_loss_percent: f64,
    pub early_trail_start: f64,
    /// Share of the open gain (in percent) the early trail gives back.
    pub early_trail_minus: f64,
    pub peak_trail_start: f64,
    /// Retrace from the peak price (in percent) tolerated by the peak trail.
    pub peak_trail_minus: f64,

    pub use_rsi_exit: bool,
    pub rsi_exit_min_profit: f64,
}

impl Default for SymbolParameters {
    fn default() -> Self {
        SymbolParameters {
            rsi_window: 100,
            rsi_oversold: 25.0,
            rsi_overbought: 75.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            volume_ma_period: 20,
            obv_period: 20,
            volume_threshold: 0.8,
            atr_period: 14,
            atr_ma_period: 28,
            atr_multiplier: 1.1,
            stop_loss_percent: 2.0,
            early_trail_start: 1.0,
            early_trail_minus: 15.0,
            peak_trail_start: 5.0,
            peak_trail_minus: 0.5,
            use_rsi_exit: true,
            rsi_exit_min_profit: 0.5,
        }
    }
}

impl SymbolParameters {
    /// Every indicator window, keyed by its configuration name.
    pub fn windows(&self) -> [(&'static str, usize); 8] {
        [
            ("rsi_window", self.rsi_window),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("volume_ma_period", self.volume_ma_period),
            ("obv_period", self.obv_period),
            ("atr_period", self.atr_period),
            ("atr_ma_period", self.atr_ma_period),
        ]
    }

    /// Fewest bars the indicator engine accepts: the longest configured window.
    pub fn min_bars(&self) -> usize {
        self.windows()
            .into_iter()
            .map(|(_, window)| window)
            .max()
            .unwrap_or(1)
            .max(1)
    }
}

/// Which entry legs the scanner requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMode {
    /// RSI, MACD cross, volume confirmation and ATR expansion must all hold.
    #[default]
    Strict,
    /// Only RSI and the MACD cross are required.
    Loose,
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryMode::Strict => write!(f, "strict"),
            EntryMode::Loose => write!(f, "loose"),
        }
    }
}

impl FromStr for EntryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(EntryMode::Strict),
            "loose" => Ok(EntryMode::Loose),
            other => Err(format!("unknown entry mode '{other}' (expected strict or loose)")),
        }
    }
}

/// Relative weight of each score component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub rsi: f64,
    pub macd: f64,
    pub volume: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            rsi: 0.4,
            macd: 0.3,
            volume: 0.3,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.rsi + self.macd + self.volume
    }
}

/// Everything the scanner and position book need, resolved per symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Traded symbols in priority order (earlier wins score ties).
    pub symbols: Vec<String>,
    pub max_positions: usize,
    pub entry_mode: EntryMode,
    pub allow_short: bool,
    pub weights: ScoreWeights,
    pub default_params: SymbolParameters,
    pub overrides: HashMap<String, SymbolParameters>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            symbols: Vec::new(),
            max_positions: 1,
            entry_mode: EntryMode::Strict,
            allow_short: true,
            weights: ScoreWeights::default(),
            default_params: SymbolParameters::default(),
            overrides: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parameters for `symbol`, falling back to the default record.
    pub fn params_for(&self, symbol: &str) -> &SymbolParameters {
        self.overrides.get(symbol).unwrap_or(&self.default_params)
    }

    /// Position of `symbol` in the priority list, if configured.
    pub fn priority_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}
