//! trailtrader: intraday entry scanning and trailing-stop position
//! management.
//!
//! Hexagonal architecture: decision logic in [`domain`], port traits in
//! [`ports`], file-backed implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod obs;
pub mod ports;
