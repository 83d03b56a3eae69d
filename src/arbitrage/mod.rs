//! Arbitrage Module
//!
//! Round-trip opportunity scanning and two-leg trade execution.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

pub mod executor;
pub mod scanner;

pub use executor::{min_out, TradeExecutor};
pub use scanner::{OpportunityScanner, ScannerConfig};
