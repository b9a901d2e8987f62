//! Open position lifecycle: stop-loss, two-tier trailing stop and RSI exit.
//!
//! A [`Position`] starts OPEN. Two one-way latches can arm while it is open:
//! the early trail (after a small gain) and the peak trail (after a large
//! one). [`Position::update`] reports the exit that fired, if any, and
//! [`Position::close`] consumes the position into an [`ExitRecord`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::TraderError;
use crate::domain::params::SymbolParameters;
use crate::domain::signal::{Direction, Opportunity};

/// Absolute tolerance for threshold comparisons.
const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExitCode {
    Stop,
    Early,
    Peak,
    Rsi,
}

impl ExitCode {
    pub const ALL: [ExitCode; 4] = [ExitCode::Stop, ExitCode::Early, ExitCode::Peak, ExitCode::Rsi];

    /// One-letter tag used in compact trade listings.
    pub fn tag(self) -> char {
        match self {
            ExitCode::Stop => 'S',
            ExitCode::Early => 'E',
            ExitCode::Peak => 'P',
            ExitCode::Rsi => 'R',
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitCode::Stop => "STOP",
            ExitCode::Early => "EARLY",
            ExitCode::Peak => "PEAK",
            ExitCode::Rsi => "RSI",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionPhase {
    Open,
    EarlyTrailArmed,
    PeakTrailArmed,
}

/// A closed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRecord {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: u64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub exit_code: ExitCode,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
}

impl ExitRecord {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn hold_minutes(&self) -> i64 {
        (self.exit_time - self.entry_time).num_minutes()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    symbol: String,
    direction: Direction,
    entry_price: f64,
    shares: u64,
    stop_loss_price: f64,
    current_price: f64,
    unrealized_pnl: f64,
    unrealized_pnl_pct: f64,
    peak_favorable_price: f64,
    early_trail_active: bool,
    early_trail_price: Option<f64>,
    peak_trail_active: bool,
    peak_trail_price: Option<f64>,
    entry_time: DateTime<Utc>,
    last_update: DateTime<Utc>,
    params: SymbolParameters,
}

impl Position {
    pub fn open(
        symbol: &str,
        direction: Direction,
        entry_price: f64,
        shares: u64,
        params: SymbolParameters,
        entry_time: DateTime<Utc>,
    ) -> Result<Self, TraderError> {
        check_price(symbol, entry_price)?;

        let stop_offset = entry_price * params.stop_loss_percent / 100.0;
        let stop_loss_price = match direction {
            Direction::Buy => entry_price - stop_offset,
            Direction::Sell => entry_price + stop_offset,
        };

        Ok(Position {
            symbol: symbol.to_string(),
            direction,
            entry_price,
            shares,
            stop_loss_price,
            current_price: entry_price,
            unrealized_pnl: 0.0,
            unrealized_pnl_pct: 0.0,
            peak_favorable_price: entry_price,
            early_trail_active: false,
            early_trail_price: None,
            peak_trail_active: false,
            peak_trail_price: None,
            entry_time,
            last_update: entry_time,
            params,
        })
    }

    pub fn from_opportunity(
        opportunity: &Opportunity,
        shares: u64,
        params: SymbolParameters,
        entry_time: DateTime<Utc>,
    ) -> Result<Self, TraderError> {
        Position::open(
            &opportunity.symbol,
            opportunity.direction,
            opportunity.entry_price,
            shares,
            params,
            entry_time,
        )
    }

    /// Feed the latest price (and optionally RSI Real) into the position.
    ///
    /// Exit checks run in order STOP, PEAK, EARLY, RSI; the first that fires
    /// is returned and the trails are left as they were. With no exit the
    /// peak moves, the latches may arm and the trails ratchet. An invalid
    /// price or RSI is rejected before anything changes.
    pub fn update(
        &mut self,
        price: f64,
        rsi: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<Option<ExitCode>, TraderError> {
        check_price(&self.symbol, price)?;
        if let Some(value) = rsi
            && !value.is_finite()
        {
            return Err(TraderError::InvalidPrice {
                symbol: self.symbol.clone(),
                price: value,
            });
        }

        let sign = self.direction.sign();
        let pnl_pct = (price / self.entry_price - 1.0) * 100.0 * sign;

        self.current_price = price;
        self.unrealized_pnl = (price - self.entry_price) * self.shares as f64 * sign;
        self.unrealized_pnl_pct = pnl_pct;
        self.last_update = now;

        if let Some(code) = self.exit_signal(price, pnl_pct, rsi) {
            return Ok(Some(code));
        }

        self.advance(price, pnl_pct);
        Ok(None)
    }

    fn exit_signal(&self, price: f64, pnl_pct: f64, rsi: Option<f64>) -> Option<ExitCode> {
        let p = &self.params;

        if pnl_pct <= -p.stop_loss_percent + TOLERANCE {
            return Some(ExitCode::Stop);
        }
        if self.peak_trail_active
            && let Some(trail) = self.peak_trail_price
            && self.retraced_to(price, trail)
        {
            return Some(ExitCode::Peak);
        }
        if self.early_trail_active
            && !self.peak_trail_active
            && let Some(trail) = self.early_trail_price
            && self.retraced_to(price, trail)
        {
            return Some(ExitCode::Early);
        }
        if p.use_rsi_exit
            && let Some(rsi) = rsi
            && pnl_pct >= p.rsi_exit_min_profit - TOLERANCE
        {
            let reversal = match self.direction {
                Direction::Buy => rsi >= p.rsi_overbought,
                Direction::Sell => rsi <= p.rsi_oversold,
            };
            if reversal {
                return Some(ExitCode::Rsi);
            }
        }
        None
    }

    fn advance(&mut self, price: f64, pnl_pct: f64) {
        let p = &self.params;

        if self.is_more_favorable(price, self.peak_favorable_price) {
            self.peak_favorable_price = price;
        }
        if !self.early_trail_active && pnl_pct >= p.early_trail_start - TOLERANCE {
            self.early_trail_active = true;
            tracing::info!(symbol = %self.symbol, pnl_pct, "early trail armed");
        }
        if !self.peak_trail_active && pnl_pct >= p.peak_trail_start - TOLERANCE {
            self.peak_trail_active = true;
            tracing::info!(symbol = %self.symbol, pnl_pct, "peak trail armed");
        }

        let peak = self.peak_favorable_price;
        if self.early_trail_active {
            let give_back = (peak - self.entry_price) * p.early_trail_minus / 100.0;
            self.early_trail_price = Some(self.tighter(self.early_trail_price, peak - give_back));
        }
        if self.peak_trail_active {
            let retrace = peak * p.peak_trail_minus / 100.0;
            let candidate = match self.direction {
                Direction::Buy => peak - retrace,
                Direction::Sell => peak + retrace,
            };
            self.peak_trail_price = Some(self.tighter(self.peak_trail_price, candidate));
        }
    }

    /// The trail level that sits closer to the market, so a trail never
    /// loosens.
    fn tighter(&self, current: Option<f64>, candidate: f64) -> f64 {
        match current {
            Some(existing) if !self.is_more_favorable(candidate, existing) => existing,
            _ => candidate,
        }
    }

    fn is_more_favorable(&self, a: f64, b: f64) -> bool {
        match self.direction {
            Direction::Buy => a > b,
            Direction::Sell => a < b,
        }
    }

    fn retraced_to(&self, price: f64, trail: f64) -> bool {
        match self.direction {
            Direction::Buy => price <= trail + TOLERANCE,
            Direction::Sell => price >= trail - TOLERANCE,
        }
    }

    /// Close the position at `exit_price`.
    pub fn close(self, exit_price: f64, exit_code: ExitCode, exit_time: DateTime<Utc>) -> ExitRecord {
        let sign = self.direction.sign();
        let pnl = (exit_price - self.entry_price) * self.shares as f64 * sign;
        let pnl_pct = (exit_price / self.entry_price - 1.0) * 100.0 * sign;
        ExitRecord {
            symbol: self.symbol,
            direction: self.direction,
            entry_price: self.entry_price,
            exit_price,
            shares: self.shares,
            pnl,
            pnl_pct,
            exit_code,
            entry_time: self.entry_time,
            exit_time,
        }
    }

    pub fn phase(&self) -> PositionPhase {
        if self.peak_trail_active {
            PositionPhase::PeakTrailArmed
        } else if self.early_trail_active {
            PositionPhase::EarlyTrailArmed
        } else {
            PositionPhase::Open
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn shares(&self) -> u64 {
        self.shares
    }

    pub fn stop_loss_price(&self) -> f64 {
        self.stop_loss_price
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.unrealized_pnl
    }

    pub fn unrealized_pnl_pct(&self) -> f64 {
        self.unrealized_pnl_pct
    }

    pub fn peak_favorable_price(&self) -> f64 {
        self.peak_favorable_price
    }

    pub fn early_trail_active(&self) -> bool {
        self.early_trail_active
    }

    pub fn early_trail_price(&self) -> Option<f64> {
        self.early_trail_price
    }

    pub fn peak_trail_active(&self) -> bool {
        self.peak_trail_active
    }

    pub fn peak_trail_price(&self) -> Option<f64> {
        self.peak_trail_price
    }

    pub fn entry_time(&self) -> DateTime<Utc> {
        self.entry_time
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn params(&self) -> &SymbolParameters {
        &self.params
    }
}

fn check_price(symbol: &str, price: f64) -> Result<(), TraderError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(TraderError::InvalidPrice {
            symbol: symbol.to_string(),
            price,
        })
    }
}
