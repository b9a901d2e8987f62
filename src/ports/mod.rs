//! Port traits: the seams between the decision engine and the outside world.

pub mod config_port;
pub mod data_port;
pub mod trade_log_port;
