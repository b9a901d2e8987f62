//! Configuration loading and validation.
//!
//! Builds an [`EngineConfig`] from a [`ConfigPort`]. Each per-symbol key is
//! resolved from the symbol's own section, then `[default]`, then the
//! built-in default. The trading thresholds have no built-in default and
//! must appear in one of the two sections.

use crate::domain::error::TraderError;
use crate::domain::params::{EngineConfig, EntryMode, ScoreWeights, SymbolParameters};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use std::collections::HashMap;
use std::str::FromStr;

pub const ENGINE_SECTION: &str = "engine";
pub const DEFAULT_SECTION: &str = "default";

pub fn load_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, TraderError> {
    let symbols = load_symbols(config)?;

    let max_positions = engine_value(config, "max_positions", 1usize)?;
    if max_positions < 1 {
        return Err(TraderError::config_invalid(
            ENGINE_SECTION,
            "max_positions",
            "max_positions must be at least 1",
        ));
    }

    let entry_mode = match config.get_string(ENGINE_SECTION, "entry_mode") {
        Some(raw) => EntryMode::from_str(&raw)
            .map_err(|reason| TraderError::config_invalid(ENGINE_SECTION, "entry_mode", reason))?,
        None => EntryMode::default(),
    };

    let allow_short = match config.get_string(ENGINE_SECTION, "allow_short") {
        Some(raw) => parse_bool(ENGINE_SECTION, "allow_short", &raw)?,
        None => true,
    };

    let weights = load_weights(config)?;
    let default_params = resolve_params(config, None)?;

    let mut overrides = HashMap::new();
    for symbol in &symbols {
        overrides.insert(symbol.clone(), resolve_params(config, Some(symbol))?);
    }

    Ok(EngineConfig {
        symbols,
        max_positions,
        entry_mode,
        allow_short,
        weights,
        default_params,
        overrides,
    })
}

fn load_symbols(config: &dyn ConfigPort) -> Result<Vec<String>, TraderError> {
    let raw = config
        .get_string(ENGINE_SECTION, "symbols")
        .ok_or_else(|| TraderError::ConfigMissing {
            section: ENGINE_SECTION.to_string(),
            key: "symbols".to_string(),
        })?;
    parse_symbols(&raw)
        .map_err(|e| TraderError::config_invalid(ENGINE_SECTION, "symbols", e.to_string()))
}

fn load_weights(config: &dyn ConfigPort) -> Result<ScoreWeights, TraderError> {
    let defaults = ScoreWeights::default();
    let weights = ScoreWeights {
        rsi: engine_value(config, "score_weight_rsi", defaults.rsi)?,
        macd: engine_value(config, "score_weight_macd", defaults.macd)?,
        volume: engine_value(config, "score_weight_volume", defaults.volume)?,
    };
    for (key, value) in [
        ("score_weight_rsi", weights.rsi),
        ("score_weight_macd", weights.macd),
        ("score_weight_volume", weights.volume),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(TraderError::config_invalid(
                ENGINE_SECTION,
                key,
                "score weights must be non-negative",
            ));
        }
    }
    Ok(weights)
}

fn engine_value<T: FromStr>(
    config: &dyn ConfigPort,
    key: &str,
    default: T,
) -> Result<T, TraderError> {
    match config.get_string(ENGINE_SECTION, key) {
        Some(raw) => parse_value(ENGINE_SECTION, key, &raw),
        None => Ok(default),
    }
}

/// Per-key lookup across a symbol section and `[default]`.
struct Resolver<'a> {
    config: &'a dyn ConfigPort,
    symbol: Option<&'a str>,
}

impl Resolver<'_> {
    fn raw(&self, key: &str) -> Option<(&str, String)> {
        if let Some(symbol) = self.symbol
            && let Some(value) = self.config.get_string(symbol, key)
        {
            return Some((symbol, value));
        }
        self.config
            .get_string(DEFAULT_SECTION, key)
            .map(|value| (DEFAULT_SECTION, value))
    }

    fn section(&self) -> &str {
        self.symbol.unwrap_or(DEFAULT_SECTION)
    }

    fn optional<T: FromStr>(&self, key: &str, builtin: T) -> Result<T, TraderError> {
        match self.raw(key) {
            Some((section, raw)) => parse_value(section, key, &raw),
            None => Ok(builtin),
        }
    }

    fn required<T: FromStr>(&self, key: &str) -> Result<T, TraderError> {
        match self.raw(key) {
            Some((section, raw)) => parse_value(section, key, &raw),
            None => Err(TraderError::ConfigMissing {
                section: self.section().to_string(),
                key: key.to_string(),
            }),
        }
    }

    fn flag(&self, key: &str, builtin: bool) -> Result<bool, TraderError> {
        match self.raw(key) {
            Some((section, raw)) => parse_bool(section, key, &raw),
            None => Ok(builtin),
        }
    }
}

/// Resolve the parameter record for `symbol`, or the `[default]` record
/// when `symbol` is `None`.
pub fn resolve_params(
    config: &dyn ConfigPort,
    symbol: Option<&str>,
) -> Result<SymbolParameters, TraderError> {
    let r = Resolver { config, symbol };
    let d = SymbolParameters::default();

    let params = SymbolParameters {
        rsi_window: r.optional("rsi_window", d.rsi_window)?,
        rsi_oversold: r.required("rsi_oversold")?,
        rsi_overbought: r.required("rsi_overbought")?,
        macd_fast: r.optional("macd_fast", d.macd_fast)?,
        macd_slow: r.optional("macd_slow", d.macd_slow)?,
        macd_signal: r.optional("macd_signal", d.macd_signal)?,
        volume_ma_period: r.optional("volume_ma_period", d.volume_ma_period)?,
        obv_period: r.optional("obv_period", d.obv_period)?,
        volume_threshold: r.optional("volume_threshold", d.volume_threshold)?,
        atr_period: r.optional("atr_period", d.atr_period)?,
        atr_ma_period: r.optional("atr_ma_period", d.atr_ma_period)?,
        atr_multiplier: r.optional("atr_multiplier", d.atr_multiplier)?,
        stop_loss_percent: r.required("stop_loss_percent")?,
        early_trail_start: r.required("early_trail_start")?,
        early_trail_minus: r.required("early_trail_minus")?,
        peak_trail_start: r.required("peak_trail_start")?,
        peak_trail_minus: r.required("peak_trail_minus")?,
        use_rsi_exit: r.flag("use_rsi_exit", d.use_rsi_exit)?,
        rsi_exit_min_profit: r.optional("rsi_exit_min_profit", d.rsi_exit_min_profit)?,
    };

    validate_params(r.section(), &params)?;
    Ok(params)
}

/// Check the internal consistency of one parameter record.
pub fn validate_params(section: &str, p: &SymbolParameters) -> Result<(), TraderError> {
    for (key, window) in p.windows() {
        if window < 1 {
            return Err(TraderError::config_invalid(section, key, "window must be at least 1"));
        }
    }

    if p.macd_fast >= p.macd_slow {
        return Err(TraderError::config_invalid(
            section,
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }

    if !(0.0..=100.0).contains(&p.rsi_oversold) {
        return Err(TraderError::config_invalid(
            section,
            "rsi_oversold",
            "rsi_oversold must be between 0 and 100",
        ));
    }
    if !(0.0..=100.0).contains(&p.rsi_overbought) {
        return Err(TraderError::config_invalid(
            section,
            "rsi_overbought",
            "rsi_overbought must be between 0 and 100",
        ));
    }
    if p.rsi_oversold >= p.rsi_overbought {
        return Err(TraderError::config_invalid(
            section,
            "rsi_oversold",
            "rsi_oversold must be below rsi_overbought",
        ));
    }

    let positives = [
        ("volume_threshold", p.volume_threshold),
        ("atr_multiplier", p.atr_multiplier),
        ("stop_loss_percent", p.stop_loss_percent),
        ("early_trail_start", p.early_trail_start),
        ("peak_trail_start", p.peak_trail_start),
    ];
    for (key, value) in positives {
        if !(value.is_finite() && value > 0.0) {
            return Err(TraderError::config_invalid(section, key, "must be positive"));
        }
    }

    if !(p.early_trail_minus > 0.0 && p.early_trail_minus <= 100.0) {
        return Err(TraderError::config_invalid(
            section,
            "early_trail_minus",
            "early_trail_minus must be in (0, 100]",
        ));
    }
    if !(p.peak_trail_minus > 0.0 && p.peak_trail_minus < 100.0) {
        return Err(TraderError::config_invalid(
            section,
            "peak_trail_minus",
            "peak_trail_minus must be in (0, 100)",
        ));
    }
    if p.peak_trail_start < p.early_trail_start {
        return Err(TraderError::config_invalid(
            section,
            "peak_trail_start",
            "peak_trail_start must not be below early_trail_start",
        ));
    }
    if !(p.rsi_exit_min_profit.is_finite() && p.rsi_exit_min_profit >= 0.0) {
        return Err(TraderError::config_invalid(
            section,
            "rsi_exit_min_profit",
            "rsi_exit_min_profit must be non-negative",
        ));
    }
    Ok(())
}

fn parse_value<T: FromStr>(section: &str, key: &str, raw: &str) -> Result<T, TraderError> {
    raw.trim()
        .parse()
        .map_err(|_| TraderError::config_invalid(section, key, format!("cannot parse '{raw}'")))
}

fn parse_bool(section: &str, key: &str, raw: &str) -> Result<bool, TraderError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(TraderError::config_invalid(
            section,
            key,
            format!("expected a boolean, got '{raw}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const THRESHOLDS: &str = "\
rsi_oversold = 25
rsi_overbought = 75
stop_loss_percent = 2.0
early_trail_start = 1.0
early_trail_minus = 15.0
peak_trail_start = 5.0
peak_trail_minus = 0.5
";

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn base(engine_extra: &str, sections: &str) -> String {
        format!("[engine]\nsymbols = AAPL, MSFT, TSLA\n{engine_extra}\n[default]\n{THRESHOLDS}\n{sections}")
    }

    fn expect_invalid(content: &str, expected_key: &str) {
        match load_engine_config(&make_config(content)) {
            Err(TraderError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_loads() {
        let config = load_engine_config(&make_config(&base("", ""))).unwrap();
        assert_eq!(config.symbols, vec!["AAPL", "MSFT", "TSLA"]);
        assert_eq!(config.max_positions, 1);
        assert_eq!(config.entry_mode, EntryMode::Strict);
        assert!(config.allow_short);
        assert_eq!(config.weights, ScoreWeights::default());
        assert_eq!(config.default_params.rsi_window, 100);
        assert_eq!(config.params_for("AAPL"), &config.default_params);
    }

    #[test]
    fn engine_keys_are_read() {
        let content = base(
            "max_positions = 3\nentry_mode = loose\nallow_short = false\nscore_weight_rsi = 1.0\n",
            "",
        );
        let config = load_engine_config(&make_config(&content)).unwrap();
        assert_eq!(config.max_positions, 3);
        assert_eq!(config.entry_mode, EntryMode::Loose);
        assert!(!config.allow_short);
        assert_eq!(config.weights.rsi, 1.0);
        assert_eq!(config.weights.macd, 0.3);
    }

    #[test]
    fn symbol_section_overrides_default() {
        let content = base("", "[TSLA]\nrsi_window = 120\nstop_loss_percent = 3.0\n");
        let config = load_engine_config(&make_config(&content)).unwrap();
        let tsla = config.params_for("TSLA");
        assert_eq!(tsla.rsi_window, 120);
        assert_eq!(tsla.stop_loss_percent, 3.0);
        assert_eq!(tsla.rsi_oversold, 25.0);
        assert_eq!(config.params_for("AAPL").rsi_window, 100);
    }

    #[test]
    fn unlisted_symbol_uses_default_record() {
        let config = load_engine_config(&make_config(&base("", ""))).unwrap();
        assert_eq!(config.params_for("NVDA"), &config.default_params);
    }

    #[test]
    fn missing_symbols_fails() {
        let content = format!("[engine]\nmax_positions = 1\n[default]\n{THRESHOLDS}");
        let err = load_engine_config(&make_config(&content)).unwrap_err();
        assert!(matches!(err, TraderError::ConfigMissing { ref key, .. } if key == "symbols"));
    }

    #[test]
    fn duplicate_symbols_fail() {
        let content = format!("[engine]\nsymbols = AAPL, aapl\n[default]\n{THRESHOLDS}");
        expect_invalid(&content, "symbols");
    }

    #[test]
    fn missing_threshold_fails() {
        let content = "[engine]\nsymbols = AAPL\n[default]\nrsi_oversold = 25\n";
        let err = load_engine_config(&make_config(content)).unwrap_err();
        assert!(matches!(
            err,
            TraderError::ConfigMissing { ref section, ref key } if section == "default" && key == "rsi_overbought"
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn peak_start_below_early_start_fails() {
        let content = base("", "[AAPL]\npeak_trail_start = 0.5\n");
        match load_engine_config(&make_config(&content)) {
            Err(TraderError::ConfigInvalid { section, key, .. }) => {
                assert_eq!(section, "AAPL");
                assert_eq!(key, "peak_trail_start");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_max_positions_fails() {
        expect_invalid(&base("max_positions = 0\n", ""), "max_positions");
    }

    #[test]
    fn bad_entry_mode_fails() {
        expect_invalid(&base("entry_mode = yolo\n", ""), "entry_mode");
    }

    #[test]
    fn bad_allow_short_fails() {
        expect_invalid(&base("allow_short = maybe\n", ""), "allow_short");
    }

    #[test]
    fn negative_weight_fails() {
        expect_invalid(&base("score_weight_macd = -0.1\n", ""), "score_weight_macd");
    }

    #[test]
    fn unparseable_number_fails() {
        expect_invalid(&base("", "[MSFT]\nrsi_window = lots\n"), "rsi_window");
    }

    #[test]
    fn zero_window_fails() {
        expect_invalid(&base("", "[MSFT]\natr_period = 0\n"), "atr_period");
    }

    #[test]
    fn macd_fast_must_be_shorter() {
        expect_invalid(&base("", "[MSFT]\nmacd_fast = 30\n"), "macd_fast");
    }

    #[test]
    fn rsi_bounds_must_be_ordered() {
        expect_invalid(&base("", "[MSFT]\nrsi_oversold = 80\n"), "rsi_oversold");
        expect_invalid(&base("", "[MSFT]\nrsi_overbought = 120\n"), "rsi_overbought");
    }

    #[test]
    fn trail_minus_ranges() {
        expect_invalid(&base("", "[MSFT]\nearly_trail_minus = 0\n"), "early_trail_minus");
        expect_invalid(&base("", "[MSFT]\npeak_trail_minus = 100\n"), "peak_trail_minus");
    }

    #[test]
    fn non_positive_stop_fails() {
        expect_invalid(&base("", "[MSFT]\nstop_loss_percent = 0\n"), "stop_loss_percent");
    }

    #[test]
    fn use_rsi_exit_flag() {
        let content = base("", "[MSFT]\nuse_rsi_exit = no\n");
        let config = load_engine_config(&make_config(&content)).unwrap();
        assert!(!config.params_for("MSFT").use_rsi_exit);
        assert!(config.params_for("AAPL").use_rsi_exit);
    }

    #[test]
    fn validate_params_accepts_defaults() {
        assert!(validate_params("default", &SymbolParameters::default()).is_ok());
    }
}
