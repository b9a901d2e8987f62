//! Running performance counters over closed trades.

use serde::{Deserialize, Serialize};

use crate::domain::position::{ExitCode, ExitRecord};

/// Closed trades per exit reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitCounts {
    pub stop: usize,
    pub early: usize,
    pub peak: usize,
    pub rsi: usize,
}

impl ExitCounts {
    fn bump(&mut self, code: ExitCode) {
        match code {
            ExitCode::Stop => self.stop += 1,
            ExitCode::Early => self.early += 1,
            ExitCode::Peak => self.peak += 1,
            ExitCode::Rsi => self.rsi += 1,
        }
    }

    pub fn get(&self, code: ExitCode) -> usize {
        match code {
            ExitCode::Stop => self.stop,
            ExitCode::Early => self.early,
            ExitCode::Peak => self.peak,
            ExitCode::Rsi => self.rsi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent of trades with positive P&L, 0 when there are none.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    /// Gross profit over gross loss; `None` without any losing P&L.
    pub profit_factor: Option<f64>,
    pub exits: ExitCounts,
    pub avg_hold_minutes: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TradeStatistics {
    total_trades: usize,
    winning_trades: usize,
    total_pnl: f64,
    gross_profit: f64,
    gross_loss: f64,
    largest_win: f64,
    largest_loss: f64,
    exits: ExitCounts,
    total_hold_minutes: i64,
}

impl TradeStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ExitRecord>) -> Self {
        let mut stats = Self::new();
        for record in records {
            stats.record(record);
        }
        stats
    }

    /// Count one closed trade. Submitting the same record twice counts it
    /// twice.
    pub fn record(&mut self, trade: &ExitRecord) {
        let pnl = trade.pnl;
        self.total_trades += 1;
        self.total_pnl += pnl;
        if trade.is_win() {
            self.winning_trades += 1;
            self.gross_profit += pnl;
            self.largest_win = self.largest_win.max(pnl);
        } else {
            self.gross_loss += pnl.abs();
            self.largest_loss = self.largest_loss.min(pnl);
        }
        self.exits.bump(trade.exit_code);
        self.total_hold_minutes += trade.hold_minutes();
    }

    pub fn total_trades(&self) -> usize {
        self.total_trades
    }

    pub fn summary(&self) -> StatisticsSummary {
        let n = self.total_trades;
        let (win_rate, avg_pnl, avg_hold_minutes) = if n > 0 {
            (
                self.winning_trades as f64 / n as f64 * 100.0,
                self.total_pnl / n as f64,
                self.total_hold_minutes as f64 / n as f64,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        let profit_factor = (self.gross_loss > 0.0).then(|| self.gross_profit / self.gross_loss);

        StatisticsSummary {
            total_trades: n,
            winning_trades: self.winning_trades,
            losing_trades: n - self.winning_trades,
            win_rate,
            total_pnl: self.total_pnl,
            avg_pnl,
            largest_win: self.largest_win,
            largest_loss: self.largest_loss,
            gross_profit: self.gross_profit,
            gross_loss: self.gross_loss,
            profit_factor,
            exits: self.exits,
            avg_hold_minutes,
        }
    }
}
