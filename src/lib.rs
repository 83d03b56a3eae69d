//! Multi-Chain Round-Trip Arbitrage Bot Library
//!
//! Scans several chains (venues) for WETH->USDC->WETH round-trip price
//! discrepancies, picks which venue to probe with a Thompson-sampling
//! bandit, and executes the best find through a two-leg swap with slippage
//! floors. Profit math is integer smallest-unit throughout; USD appears
//! only in reporting.
//!
//! Author: AI-Generated
//! Created: 2026-08-10

pub mod alert;
pub mod arbitrage;
pub mod bandit;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod engine;
pub mod report;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use arbitrage::{OpportunityScanner, ScannerConfig, TradeExecutor};
pub use bandit::VenueBandit;
pub use chain::{QuoteSource, RpcVenueClient, TradeClient, VenueClients};
pub use config::{load_config, Config};
pub use engine::{ArbEngine, EngineConfig};
pub use types::{ExecutionResult, Opportunity, Route, RouteLeg, Venue};
