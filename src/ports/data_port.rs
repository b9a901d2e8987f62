//! Market data access port.

use crate::domain::bar::Bar;
use crate::domain::error::TraderError;

pub trait DataPort {
    /// All bars on record for `symbol`, ascending by timestamp.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, TraderError>;
}
