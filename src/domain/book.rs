//! Open positions indexed by symbol, bounded by `max_positions`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::error::TraderError;
use crate::domain::params::SymbolParameters;
use crate::domain::position::{ExitRecord, Position};
use crate::domain::signal::Opportunity;

#[derive(Debug, Clone)]
pub struct PositionBook {
    max_positions: usize,
    positions: BTreeMap<String, Position>,
}

impl PositionBook {
    pub fn new(max_positions: usize) -> Self {
        PositionBook {
            max_positions,
            positions: BTreeMap::new(),
        }
    }

    pub fn max_positions(&self) -> usize {
        self.max_positions
    }

    pub fn has_free_slot(&self) -> bool {
        self.positions.len() < self.max_positions
    }

    pub fn open(
        &mut self,
        opportunity: &Opportunity,
        shares: u64,
        params: SymbolParameters,
        entry_time: DateTime<Utc>,
    ) -> Result<&Position, TraderError> {
        if self.positions.contains_key(&opportunity.symbol) {
            return Err(TraderError::DuplicatePosition {
                symbol: opportunity.symbol.clone(),
            });
        }
        if !self.has_free_slot() {
            return Err(TraderError::PositionLimit {
                max: self.max_positions,
            });
        }

        let position = Position::from_opportunity(opportunity, shares, params, entry_time)?;
        tracing::info!(
            symbol = %opportunity.symbol,
            direction = %opportunity.direction,
            price = opportunity.entry_price,
            shares,
            stop = position.stop_loss_price(),
            "position opened"
        );
        let slot = self
            .positions
            .entry(opportunity.symbol.clone())
            .or_insert(position);
        Ok(&*slot)
    }

    /// Update one position. When an exit fires the position is closed at
    /// `price`, removed from the book and its record returned.
    pub fn update(
        &mut self,
        symbol: &str,
        price: f64,
        rsi: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<Option<ExitRecord>, TraderError> {
        let position = self
            .positions
            .get_mut(symbol)
            .ok_or_else(|| TraderError::UnknownPosition {
                symbol: symbol.to_string(),
            })?;

        let Some(code) = position.update(price, rsi, now)? else {
            return Ok(None);
        };

        let Some(position) = self.positions.remove(symbol) else {
            return Ok(None);
        };
        let record = position.close(price, code, now);
        tracing::info!(
            symbol = %record.symbol,
            exit = %record.exit_code,
            price = record.exit_price,
            pnl = record.pnl,
            pnl_pct = record.pnl_pct,
            "position closed"
        );
        Ok(Some(record))
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
