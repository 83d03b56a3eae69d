//! Arbitrage Engine
//!
//! The main loop: sample a venue from the bandit, scan it, execute the best
//! find when it clears the threshold, and feed exactly one binary outcome
//! back into the bandit - every iteration, no exceptions, because that
//! feedback signal is what lets exploration converge. Strictly sequential:
//! the trading account balance is the one shared mutable resource and the
//! single-threaded loop is its serialization discipline.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use crate::alert::OperatorAlerter;
use crate::arbitrage::{OpportunityScanner, TradeExecutor};
use crate::bandit::VenueBandit;
use crate::chain::VenueClients;
use crate::report::{IterationOutcome, IterationRecord, ReportSink, SessionSummary};
use crate::stats::{wei_to_usd, SessionStats};
use crate::types::{Opportunity, Venue};
use alloy::primitives::{I256, U256};
use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Engine tunables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Iterations before the run ends
    pub iterations: u64,
    /// Pause between iterations (RPC courtesy), skipped after the last
    pub iteration_delay: Duration,
    /// Minimum net profit (smallest units) worth paying two confirmations for
    pub min_profit_wei: U256,
    /// Fixed native price for USD reporting
    pub native_price_usd: Decimal,
}

/// Select -> scan -> execute -> update loop over the configured venues
pub struct ArbEngine {
    config: EngineConfig,
    venues: Vec<Venue>,
    clients: HashMap<String, VenueClients>,
    bandit: VenueBandit,
    scanner: OpportunityScanner,
    executor: TradeExecutor,
    alerter: OperatorAlerter,
    sinks: Vec<Box<dyn ReportSink>>,
    stats: SessionStats,
    rng: StdRng,
    shutdown: Arc<AtomicBool>,
}

impl ArbEngine {
    pub fn new(
        config: EngineConfig,
        venues: Vec<Venue>,
        clients: HashMap<String, VenueClients>,
        scanner: OpportunityScanner,
        executor: TradeExecutor,
    ) -> Self {
        let bandit = VenueBandit::new(venues.iter().map(|v| v.id.clone()));
        Self {
            config,
            venues,
            clients,
            bandit,
            scanner,
            executor,
            alerter: OperatorAlerter::new(None),
            sinks: vec![Box::new(crate::report::LogSink)],
            stats: SessionStats::new(),
            rng: StdRng::from_entropy(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_alerter(mut self, alerter: OperatorAlerter) -> Self {
        self.alerter = alerter;
        self
    }

    /// Replace the default log sink with an explicit sink set.
    pub fn with_sinks(mut self, sinks: Vec<Box<dyn ReportSink>>) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn add_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Deterministic selection for tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    /// Flag checked at iteration boundaries; setting it ends the run early
    /// but still emits the session summary.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Run the loop to completion (or shutdown) and return the summary.
    pub async fn run(&mut self) -> Result<SessionSummary> {
        info!(
            iterations = self.config.iterations,
            venues = self.venues.len(),
            min_profit = %self.config.min_profit_wei,
            "engine starting"
        );

        for iteration in 1..=self.config.iterations {
            if self.shutdown.load(Ordering::SeqCst) {
                info!(iteration, "shutdown requested, ending run early");
                break;
            }

            let record = self.run_iteration(iteration).await?;
            self.emit_record(&record);

            let last = iteration == self.config.iterations;
            if !last && !self.shutdown.load(Ordering::SeqCst) {
                sleep(self.config.iteration_delay).await;
            }
        }

        let summary = self.build_summary();
        for sink in &mut self.sinks {
            if let Err(e) = sink.summary(&summary) {
                warn!(error = %e, "report sink rejected the session summary");
            }
        }
        let line = self.stats.summary_line(self.config.native_price_usd);
        info!("{line}");
        self.alerter.session_end(&line).await;
        Ok(summary)
    }

    /// One full SELECT -> SCAN -> outcome -> UPDATE_BANDIT pass.
    async fn run_iteration(&mut self, iteration: u64) -> Result<IterationRecord> {
        let venue_id = self
            .bandit
            .select(&mut self.rng)
            .context("no venues registered with the bandit")?;
        let venue = self
            .venues
            .iter()
            .find(|v| v.id == venue_id)
            .cloned()
            .with_context(|| format!("venue {venue_id} missing from configuration"))?;
        let clients = self
            .clients
            .get(&venue_id)
            .cloned()
            .with_context(|| format!("venue {venue_id} has no clients"))?;

        let mut opportunities = self.scanner.scan(&venue, &*clients.quotes).await;
        let opportunity_count = opportunities.len();
        self.stats.record_scan(&venue_id, opportunity_count);

        let (outcome, best) = if opportunities.is_empty() {
            (IterationOutcome::NoOpportunity, None)
        } else {
            opportunities.sort_by(|a, b| b.net_profit.cmp(&a.net_profit));
            let best = opportunities.swap_remove(0);

            if best.net_profit < self.config.min_profit_wei {
                // Dust: not worth two on-chain confirmation waits
                (IterationOutcome::BelowThreshold, Some(best))
            } else {
                let result = self.executor.execute(&best, &venue, &*clients.trader).await;
                self.stats
                    .record_trade(&venue_id, result.succeeded, result.realized_profit);
                if let Some(failure) = &result.failure {
                    if failure.stranded() {
                        self.alerter
                            .stranded_trade(&venue_id, &best.route.to_string(), &failure.to_string())
                            .await;
                    }
                }
                (
                    IterationOutcome::Executed {
                        succeeded: result.succeeded,
                    },
                    Some(best),
                )
            }
        };

        // Exactly one feedback signal per iteration
        let success = matches!(outcome, IterationOutcome::Executed { succeeded: true });
        self.bandit.update(&venue_id, success);

        Ok(self.make_record(iteration, venue_id, opportunity_count, outcome, best))
    }

    fn make_record(
        &self,
        iteration: u64,
        venue: String,
        opportunity_count: usize,
        outcome: IterationOutcome,
        best: Option<Opportunity>,
    ) -> IterationRecord {
        let net_estimate = best.as_ref().map(|b| b.net_profit);
        IterationRecord {
            iteration,
            venue,
            opportunity_count,
            best_route: best.map(|b| b.route.to_string()),
            net_profit_estimate: net_estimate.map(|n| n.to_string()),
            net_profit_usd: net_estimate.map(|n| {
                wei_to_usd(
                    I256::try_from(n).unwrap_or(I256::MAX),
                    self.config.native_price_usd,
                )
                .to_string()
            }),
            executed: matches!(outcome, IterationOutcome::Executed { .. }),
            outcome,
            timestamp: Utc::now(),
        }
    }

    fn emit_record(&mut self, record: &IterationRecord) {
        for sink in &mut self.sinks {
            if let Err(e) = sink.record(record) {
                warn!(error = %e, "report sink rejected an iteration record");
            }
        }
    }

    fn build_summary(&self) -> SessionSummary {
        SessionSummary {
            started_at: self.stats.started_at,
            finished_at: Utc::now(),
            iterations: self.stats.iterations,
            scans: self.stats.scans,
            trades: self.stats.trades,
            successful_trades: self.stats.successful_trades,
            cumulative_profit_wei: self.stats.cumulative_profit_wei.to_string(),
            cumulative_profit_usd: wei_to_usd(
                self.stats.cumulative_profit_wei,
                self.config.native_price_usd,
            )
            .to_string(),
            win_rate: self.stats.win_rate(),
            venues: self.stats.venues.clone(),
            arms: self.bandit.snapshot(),
        }
    }
}
