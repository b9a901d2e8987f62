//! One decision cycle over a batch of market data.
//!
//! Open positions are updated first; exits are recorded into the running
//! statistics and, when a trade log is attached, persisted. If the book
//! still has room the scanner looks for a new entry among the symbols that
//! are not already held.

use chrono::{DateTime, Utc};

use crate::domain::bar::MarketData;
use crate::domain::book::PositionBook;
use crate::domain::error::TraderError;
use crate::domain::indicator::compute_indicators;
use crate::domain::params::EngineConfig;
use crate::domain::position::{ExitRecord, Position};
use crate::domain::scanner::{ScanOutcome, Scanner};
use crate::domain::signal::Opportunity;
use crate::domain::stats::TradeStatistics;
use crate::ports::trade_log_port::TradeLogPort;

/// A price update the book refused.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedUpdate {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub exits: Vec<ExitRecord>,
    pub rejected: Vec<RejectedUpdate>,
    /// Exits the attached trade log failed to persist.
    pub log_errors: Vec<String>,
    /// `None` when the book was full and no scan ran.
    pub scan: Option<ScanOutcome>,
}

impl CycleReport {
    pub fn opportunity(&self) -> Option<&Opportunity> {
        self.scan.as_ref().and_then(|s| s.best.as_ref())
    }
}

pub struct TradingCycle {
    scanner: Scanner,
    book: PositionBook,
    stats: TradeStatistics,
    trade_log: Option<Box<dyn TradeLogPort>>,
}

impl TradingCycle {
    pub fn new(config: EngineConfig) -> Self {
        let book = PositionBook::new(config.max_positions);
        TradingCycle {
            scanner: Scanner::new(config),
            book,
            stats: TradeStatistics::new(),
            trade_log: None,
        }
    }

    /// Append every closed trade to `log`.
    pub fn with_trade_log(mut self, log: Box<dyn TradeLogPort>) -> Self {
        self.trade_log = Some(log);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        self.scanner.config()
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    pub fn stats(&self) -> &TradeStatistics {
        &self.stats
    }

    pub fn run(&mut self, market: &MarketData, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();

        for symbol in self.book.symbols() {
            let Some(bars) = market.get(&symbol) else {
                continue;
            };
            let Some(last) = bars.last() else {
                continue;
            };

            let rsi = self.latest_rsi(&symbol, market);
            match self.book.update(&symbol, last.close, rsi, now) {
                Ok(Some(record)) => {
                    self.stats.record(&record);
                    if let Some(log) = self.trade_log.as_mut()
                        && let Err(e) = log.append(&record)
                    {
                        tracing::error!(symbol = %record.symbol, error = %e, "trade not logged");
                        report.log_errors.push(e.to_string());
                    }
                    report.exits.push(record);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "price update rejected");
                    report.rejected.push(RejectedUpdate {
                        symbol,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if self.book.has_free_slot() {
            let book = &self.book;
            report.scan = Some(self.scanner.scan_where(market, |s| !book.contains(s)));
        } else {
            tracing::debug!(open = self.book.len(), "book full, scan skipped");
        }
        report
    }

    /// RSI Real of the latest bar, or `None` when the series is too short.
    fn latest_rsi(&self, symbol: &str, market: &MarketData) -> Option<f64> {
        let bars = market.get(symbol)?;
        let params = self
            .book
            .get(symbol)
            .map(Position::params)
            .unwrap_or_else(|| self.config().params_for(symbol));
        match compute_indicators(symbol, bars, params) {
            Ok(snapshots) => snapshots.last().map(|s| s.rsi_real),
            Err(e) => {
                tracing::debug!(symbol, error = %e, "price-only update");
                None
            }
        }
    }

    /// Open a position for `opportunity` with the symbol's parameters.
    pub fn open_position(
        &mut self,
        opportunity: &Opportunity,
        shares: u64,
        now: DateTime<Utc>,
    ) -> Result<&Position, TraderError> {
        let params = self.scanner.config().params_for(&opportunity.symbol).clone();
        self.book.open(opportunity, shares, params, now)
    }
}
