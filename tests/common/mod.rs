#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
pub use trailtrader::domain::bar::{Bar, MarketData};
use trailtrader::domain::error::TraderError;
use trailtrader::domain::params::SymbolParameters;
use trailtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap()
}

/// One-minute bars with a fixed ±0.5 high/low band around each close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: t0() + Duration::minutes(i as i64),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Steady decline followed by a partial rebound on the last bar. With
/// [`small_params`] this ends on a MACD cross up with RSI Real near its low.
pub fn buy_setup(step: f64) -> Vec<Bar> {
    let mut closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64 * step).collect();
    let last = closes[closes.len() - 1];
    closes.push(last + step * 0.6);
    bars_from_closes(&closes)
}

/// Mirror image of [`buy_setup`]: a rally ending on a MACD cross down.
pub fn sell_setup(step: f64) -> Vec<Bar> {
    let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64 * step).collect();
    let last = closes[closes.len() - 1];
    closes.push(last - step * 0.6);
    bars_from_closes(&closes)
}

pub fn small_params() -> SymbolParameters {
    SymbolParameters {
        rsi_window: 10,
        macd_fast: 3,
        macd_slow: 6,
        macd_signal: 3,
        volume_ma_period: 5,
        obv_period: 5,
        atr_period: 3,
        atr_ma_period: 5,
        ..SymbolParameters::default()
    }
}

pub fn market(entries: Vec<(&str, Vec<Bar>)>) -> MarketData {
    entries
        .into_iter()
        .map(|(symbol, bars)| (symbol.to_string(), bars))
        .collect()
}

pub fn write_csv(dir: &std::path::Path, symbol: &str, bars: &[Bar]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.to_rfc3339(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

/// Complete configuration with short indicator windows and loose entries.
pub const LOOSE_INI: &str = "\
[engine]
symbols = AAPL, MSFT
max_positions = 1
entry_mode = loose
allow_short = true

[default]
rsi_window = 10
macd_fast = 3
macd_slow = 6
macd_signal = 3
volume_ma_period = 5
obv_period = 5
atr_period = 3
atr_ma_period = 5
rsi_oversold = 25
rsi_overbought = 75
stop_loss_percent = 2.0
early_trail_start = 1.0
early_trail_minus = 15.0
peak_trail_start = 5.0
peak_trail_minus = 0.5
";
