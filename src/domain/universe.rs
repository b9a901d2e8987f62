//! Symbol universe: parsing the configured symbol list and loading a
//! [`MarketData`] batch for it through a [`DataPort`].

use std::collections::HashSet;

use crate::domain::bar::{is_ascending, MarketData};
use crate::domain::error::TraderError;
use crate::domain::scanner::SkippedSymbol;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Split a comma-separated symbol list, uppercasing each entry. Order is
/// kept since it doubles as the tie-break priority.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug)]
pub struct LoadedMarket {
    pub market: MarketData,
    pub skipped: Vec<SkippedSymbol>,
}

/// Fetch bars for every symbol. Symbols whose data cannot be read, is empty,
/// or is out of order are skipped with a warning; only an empty result is
/// an error.
pub fn load_market(
    data_port: &dyn DataPort,
    symbols: &[String],
) -> Result<LoadedMarket, TraderError> {
    let mut market = MarketData::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let reason = match data_port.fetch_bars(symbol) {
            Ok(bars) if bars.is_empty() => "no data found".to_string(),
            Ok(bars) if !is_ascending(&bars) => "timestamps not ascending".to_string(),
            Ok(bars) => {
                tracing::debug!(symbol = %symbol, bars = bars.len(), "bars loaded");
                market.insert(symbol.clone(), bars);
                continue;
            }
            Err(e) => e.to_string(),
        };
        tracing::warn!(symbol = %symbol, reason = %reason, "symbol skipped");
        skipped.push(SkippedSymbol {
            symbol: symbol.clone(),
            reason,
        });
    }

    if market.is_empty() {
        return Err(TraderError::Data {
            reason: format!("no usable data for any of {} symbols", symbols.len()),
        });
    }

    Ok(LoadedMarket { market, skipped })
}
