//! Closed-trade persistence port.

use crate::domain::error::TraderError;
use crate::domain::position::ExitRecord;

pub trait TradeLogPort {
    fn append(&mut self, record: &ExitRecord) -> Result<(), TraderError>;

    /// Every record written so far, oldest first.
    fn read_all(&self) -> Result<Vec<ExitRecord>, TraderError>;
}
