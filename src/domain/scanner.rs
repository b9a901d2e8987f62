//! Cross-symbol opportunity scanner.
//!
//! Runs the indicator engine over every symbol in a [`MarketData`] batch,
//! evaluates the entry rule on the latest bar, scores the candidates and
//! picks the best one. A symbol without enough history is skipped, never
//! fatal.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::bar::{Bar, MarketData};
use crate::domain::error::TraderError;
use crate::domain::indicator::compute_indicators;
use crate::domain::params::EngineConfig;
use crate::domain::signal::{evaluate_entry, score_candidate, Direction, Opportunity};

/// A symbol left out of a scan, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    /// The winning candidate, if any qualified.
    pub best: Option<Opportunity>,
    /// Every qualifying candidate, best first.
    pub candidates: Vec<Opportunity>,
    pub skipped: Vec<SkippedSymbol>,
}

pub struct Scanner {
    config: EngineConfig,
}

impl Scanner {
    pub fn new(config: EngineConfig) -> Self {
        Scanner { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scan(&self, market: &MarketData) -> ScanOutcome {
        self.scan_where(market, |_| true)
    }

    pub fn scan_best(&self, market: &MarketData) -> Option<Opportunity> {
        self.scan(market).best
    }

    /// Scan only the symbols for which `include` returns true.
    pub fn scan_where<F>(&self, market: &MarketData, include: F) -> ScanOutcome
    where
        F: Fn(&str) -> bool,
    {
        let mut outcome = ScanOutcome::default();

        for (symbol, bars) in market {
            if !include(symbol) {
                continue;
            }
            match self.evaluate_symbol(symbol, bars) {
                Ok(Some(opportunity)) => outcome.candidates.push(opportunity),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "symbol skipped");
                    outcome.skipped.push(SkippedSymbol {
                        symbol: symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome.candidates.sort_by(|a, b| self.rank(a, b));
        outcome.best = outcome.candidates.first().cloned();

        if let Some(best) = &outcome.best {
            tracing::info!(
                symbol = %best.symbol,
                direction = %best.direction,
                score = best.score,
                price = best.entry_price,
                candidates = outcome.candidates.len(),
                "opportunity selected"
            );
        }
        outcome
    }

    fn evaluate_symbol(
        &self,
        symbol: &str,
        bars: &[Bar],
    ) -> Result<Option<Opportunity>, TraderError> {
        let params = self.config.params_for(symbol);
        let snapshots = compute_indicators(symbol, bars, params)?;
        let Some(latest) = snapshots.last() else {
            return Ok(None);
        };

        let signals = evaluate_entry(latest, params, self.config.entry_mode);
        tracing::debug!(
            symbol,
            rsi = latest.rsi_real,
            rsi_buy = signals.rsi_buy,
            rsi_sell = signals.rsi_sell,
            macd_buy = signals.macd_buy,
            macd_sell = signals.macd_sell,
            volume_buy = signals.volume_buy,
            volume_sell = signals.volume_sell,
            high_volatility = signals.high_volatility,
            "entry evaluated"
        );

        let direction = match signals.direction() {
            Some(Direction::Sell) if !self.config.allow_short => return Ok(None),
            Some(d) => d,
            None => return Ok(None),
        };

        let score = score_candidate(latest, params, direction, &self.config.weights);
        Ok(Some(Opportunity {
            symbol: symbol.to_string(),
            direction,
            score,
            entry_price: latest.close,
            indicators: latest.clone(),
        }))
    }

    /// Higher score first, then configured priority, then symbol name.
    fn rank(&self, a: &Opportunity, b: &Opportunity) -> Ordering {
        b.score
            .total_cmp(&a.score)
            .then_with(|| {
                let pa = self.config.priority_of(&a.symbol).unwrap_or(usize::MAX);
                let pb = self.config.priority_of(&b.symbol).unwrap_or(usize::MAX);
                pa.cmp(&pb)
            })
            .then_with(|| a.symbol.cmp(&b.symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::{EntryMode, ScoreWeights, SymbolParameters};
    use chrono::{Duration, TimeZone, Utc};

    fn small_params() -> SymbolParameters {
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

    fn loose_config(symbols: &[&str]) -> EngineConfig {
        EngineConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            entry_mode: EntryMode::Loose,
            default_params: small_params(),
            ..EngineConfig::default()
        }
    }

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    /// Long decline followed by a single uptick: MACD crosses up on the
    /// last bar while the close sits near the bottom of its range.
    fn buy_setup(depth: f64) -> Vec<Bar> {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64 * depth).collect();
        let last = *closes.last().unwrap();
        closes.push(last + depth * 0.6);
        bars_from_closes(&closes)
    }

    fn sell_setup() -> Vec<Bar> {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let last = *closes.last().unwrap();
        closes.push(last - 0.6);
        bars_from_closes(&closes)
    }

    fn flat() -> Vec<Bar> {
        bars_from_closes(&[100.0; 20])
    }

    fn market(entries: Vec<(&str, Vec<Bar>)>) -> MarketData {
        entries
            .into_iter()
            .map(|(s, b)| (s.to_string(), b))
            .collect()
    }

    #[test]
    fn empty_market_yields_none() {
        let scanner = Scanner::new(loose_config(&[]));
        let outcome = scanner.scan(&MarketData::new());
        assert!(outcome.best.is_none());
        assert!(outcome.candidates.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn flat_market_yields_none() {
        let scanner = Scanner::new(loose_config(&["AAPL"]));
        let outcome = scanner.scan(&market(vec![("AAPL", flat())]));
        assert!(outcome.best.is_none());
    }

    #[test]
    fn loose_buy_is_found() {
        let scanner = Scanner::new(loose_config(&["AAPL"]));
        let best = scanner
            .scan_best(&market(vec![("AAPL", buy_setup(1.0))]))
            .unwrap();
        assert_eq!(best.symbol, "AAPL");
        assert_eq!(best.direction, Direction::Buy);
        assert!(best.score > 0.0 && best.score <= 100.0);
        assert_eq!(best.entry_price, best.indicators.close);
    }

    #[test]
    fn loose_sell_is_found() {
        let scanner = Scanner::new(loose_config(&["MSFT"]));
        let best = scanner.scan_best(&market(vec![("MSFT", sell_setup())])).unwrap();
        assert_eq!(best.direction, Direction::Sell);
    }

    #[test]
    fn buy_only_mode_suppresses_sell() {
        let config = EngineConfig {
            allow_short: false,
            ..loose_config(&["MSFT"])
        };
        let scanner = Scanner::new(config);
        assert!(scanner.scan_best(&market(vec![("MSFT", sell_setup())])).is_none());
    }

    #[test]
    fn short_series_is_skipped_not_fatal() {
        let scanner = Scanner::new(loose_config(&["AAPL", "TSLA"]));
        let outcome = scanner.scan(&market(vec![
            ("AAPL", buy_setup(1.0)),
            ("TSLA", bars_from_closes(&[100.0; 3])),
        ]));
        assert_eq!(outcome.best.unwrap().symbol, "AAPL");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].symbol, "TSLA");
    }

    #[test]
    fn ties_follow_priority_order() {
        let scanner = Scanner::new(loose_config(&["MSFT", "AAPL"]));
        let outcome = scanner.scan(&market(vec![
            ("AAPL", buy_setup(1.0)),
            ("MSFT", buy_setup(1.0)),
        ]));
        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.candidates[0].score, outcome.candidates[1].score);
        assert_eq!(outcome.best.unwrap().symbol, "MSFT");
    }

    #[test]
    fn unlisted_symbols_rank_after_listed() {
        let scanner = Scanner::new(loose_config(&["ZZZ"]));
        let outcome = scanner.scan(&market(vec![
            ("BBB", buy_setup(1.0)),
            ("AAA", buy_setup(1.0)),
            ("ZZZ", buy_setup(1.0)),
        ]));
        let order: Vec<&str> = outcome.candidates.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(order, vec!["ZZZ", "AAA", "BBB"]);
    }

    #[test]
    fn candidates_are_sorted_by_score() {
        let macd_only = EngineConfig {
            weights: ScoreWeights {
                rsi: 0.0,
                macd: 1.0,
                volume: 0.0,
            },
            ..loose_config(&[])
        };
        let scanner = Scanner::new(macd_only);
        let outcome = scanner.scan(&market(vec![
            ("AAA", buy_setup(0.2)),
            ("BBB", buy_setup(1.0)),
        ]));
        assert_eq!(outcome.candidates.len(), 2);
        assert!(outcome.candidates[0].score >= outcome.candidates[1].score);
    }

    #[test]
    fn scan_where_excludes_symbols() {
        let scanner = Scanner::new(loose_config(&["AAPL", "MSFT"]));
        let data = market(vec![("AAPL", buy_setup(1.0)), ("MSFT", buy_setup(1.0))]);
        let outcome = scanner.scan_where(&data, |s| s != "AAPL");
        assert_eq!(outcome.best.unwrap().symbol, "MSFT");
    }

    #[test]
    fn strict_mode_needs_volume_confirmation() {
        let config = EngineConfig {
            entry_mode: EntryMode::Strict,
            ..loose_config(&["AAPL"])
        };
        let scanner = Scanner::new(config);
        // constant volume never confirms
        assert!(scanner.scan_best(&market(vec![("AAPL", buy_setup(1.0))])).is_none());
    }
}
