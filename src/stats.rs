//! Session Statistics
//!
//! Running totals for one engine run: iteration/scan/trade counters, per-venue
//! tallies, cumulative realized profit, and the USD rendering used in logs and
//! the session summary. Profit accumulates in signed smallest units; USD
//! conversion is display-only and never feeds a decision.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use alloy::primitives::I256;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Smallest units per native token (18 decimals)
const WEI_PER_NATIVE: u64 = 1_000_000_000_000_000_000;

/// Per-venue running totals
#[derive(Debug, Clone, Default, Serialize)]
pub struct VenueTally {
    /// Times the bandit picked this venue
    pub selections: u64,
    /// Scans performed (equals selections in the current engine)
    pub scans: u64,
    /// Opportunities the scanner surfaced
    pub opportunities: u64,
    /// Execution attempts
    pub trades: u64,
    /// Execution attempts where every step confirmed
    pub wins: u64,
    /// Sum of realized profit across completed trades, smallest units
    pub realized_profit_wei: I256,
}

/// Totals for one engine run
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub started_at: DateTime<Utc>,
    pub iterations: u64,
    pub scans: u64,
    pub opportunities: u64,
    pub trades: u64,
    pub successful_trades: u64,
    pub cumulative_profit_wei: I256,
    pub venues: BTreeMap<String, VenueTally>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            iterations: 0,
            scans: 0,
            opportunities: 0,
            trades: 0,
            successful_trades: 0,
            cumulative_profit_wei: I256::ZERO,
            venues: BTreeMap::new(),
        }
    }

    fn tally(&mut self, venue_id: &str) -> &mut VenueTally {
        self.venues.entry(venue_id.to_string()).or_default()
    }

    /// One iteration began: the bandit selected and the scanner ran.
    pub fn record_scan(&mut self, venue_id: &str, opportunity_count: usize) {
        self.iterations += 1;
        self.scans += 1;
        self.opportunities += opportunity_count as u64;
        let tally = self.tally(venue_id);
        tally.selections += 1;
        tally.scans += 1;
        tally.opportunities += opportunity_count as u64;
    }

    /// An execution attempt finished.
    pub fn record_trade(&mut self, venue_id: &str, succeeded: bool, realized_profit: I256) {
        self.trades += 1;
        let tally = self.tally(venue_id);
        tally.trades += 1;
        if succeeded {
            self.successful_trades += 1;
            self.cumulative_profit_wei += realized_profit;
            let tally = self.tally(venue_id);
            tally.wins += 1;
            tally.realized_profit_wei += realized_profit;
        }
    }

    /// Fraction of execution attempts that completed; 0 before the first.
    pub fn win_rate(&self) -> f64 {
        if self.trades == 0 {
            return 0.0;
        }
        self.successful_trades as f64 / self.trades as f64
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// One-line summary for the end-of-run log
    pub fn summary_line(&self, native_price_usd: Decimal) -> String {
        format!(
            "{} iterations, {} scans, {} trades ({} ok, {:.1}% win rate) | Net: {} wei (~${}) | Uptime: {}s",
            self.iterations,
            self.scans,
            self.trades,
            self.successful_trades,
            self.win_rate() * 100.0,
            self.cumulative_profit_wei,
            wei_to_usd(self.cumulative_profit_wei, native_price_usd),
            self.uptime_secs()
        )
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a signed smallest-unit amount as USD at a fixed native price.
///
/// Reporting only - decisions stay in integer wei.
pub fn wei_to_usd(wei: I256, native_price_usd: Decimal) -> Decimal {
    let wei_dec = Decimal::from_str(&wei.to_string()).unwrap_or(Decimal::ZERO);
    (wei_dec / Decimal::from(WEI_PER_NATIVE) * native_price_usd).round_dp(4)
}
