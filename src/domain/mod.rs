//! Core domain types and logic.

pub mod bar;
pub mod book;
pub mod config_validation;
pub mod cycle;
pub mod error;
pub mod indicator;
pub mod params;
pub mod position;
pub mod scanner;
pub mod signal;
pub mod stats;
pub mod universe;
