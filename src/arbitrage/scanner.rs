//! Opportunity Scanner
//!
//! Enumerates candidate round-trip routes on one venue (trial amounts x
//! ordered distinct fee-tier pairs, plus alternate-router crossings), quotes
//! both legs of each, and keeps every combination whose net profit is
//! strictly positive. A scan never fails: a route whose quote errors is
//! skipped, and a missing gas rate falls back to the configured floor.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use crate::chain::QuoteSource;
use crate::types::{signed_delta, Opportunity, Route, RouteLeg, Venue};
use alloy::primitives::{I256, U256};
use futures::future::join_all;
use tracing::{debug, warn};

/// Scanner tunables, injected so tests can supply minimal fixtures
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Trial input sizes in native smallest units
    pub trial_amounts: Vec<U256>,
    /// Primary fee tier used on the concentrated-liquidity side of
    /// alternate-router routes
    pub alternate_route_fee_tier: u32,
    /// Gas units assumed for one round trip
    pub estimated_gas_units: u64,
    /// Gas price substituted when the live rate is unavailable
    pub gas_price_floor_wei: U256,
}

/// Round-trip scanner for one or more venues
pub struct OpportunityScanner {
    config: ScannerConfig,
}

impl OpportunityScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Scan `venue` for profitable round trips.
    ///
    /// Returns every strictly profitable combination, unsorted; the engine
    /// sorts by net profit. Never errors — per-route failures are skipped.
    pub async fn scan(&self, venue: &Venue, quotes: &dyn QuoteSource) -> Vec<Opportunity> {
        let cost_estimate = self.estimate_cost(venue, quotes).await;
        let routes = self.candidate_routes(venue);

        let mut candidates = Vec::with_capacity(routes.len() * self.config.trial_amounts.len());
        for &amount in &self.config.trial_amounts {
            for &route in &routes {
                candidates.push((amount, route));
            }
        }

        // Quote combinations concurrently; they share no mutable state and
        // are aggregated only after the join.
        let evaluations = join_all(
            candidates
                .iter()
                .map(|&(amount, route)| self.evaluate(venue, quotes, amount, route, cost_estimate)),
        )
        .await;

        let opportunities: Vec<Opportunity> = evaluations.into_iter().flatten().collect();
        debug!(
            venue = %venue.id,
            candidates = candidates.len(),
            profitable = opportunities.len(),
            %cost_estimate,
            "scan complete"
        );
        opportunities
    }

    /// Round-trip transaction cost in native smallest units.
    ///
    /// Falls back to the configured floor rate rather than failing the scan.
    async fn estimate_cost(&self, venue: &Venue, quotes: &dyn QuoteSource) -> U256 {
        let rate = match quotes.gas_price().await {
            Ok(rate) => rate,
            Err(e) => {
                warn!(
                    venue = %venue.id,
                    floor = %self.config.gas_price_floor_wei,
                    error = %e,
                    "gas rate unavailable, using floor"
                );
                self.config.gas_price_floor_wei
            }
        };
        rate * U256::from(self.config.estimated_gas_units)
    }

    /// All routes worth probing on this venue.
    ///
    /// Ordered distinct tier pairs on the primary router; when an alternate
    /// router exists, both crossing directions with the representative tier.
    fn candidate_routes(&self, venue: &Venue) -> Vec<Route> {
        let mut routes = Vec::new();
        for &fee_a in &venue.fee_tiers {
            for &fee_b in &venue.fee_tiers {
                // Same tier both ways is not an arbitrage
                if fee_a != fee_b {
                    routes.push(Route::new(RouteLeg::FeeTier(fee_a), RouteLeg::FeeTier(fee_b)));
                }
            }
        }
        if venue.has_alternate_router() {
            let primary = RouteLeg::FeeTier(self.config.alternate_route_fee_tier);
            routes.push(Route::new(primary, RouteLeg::AlternateRouter));
            routes.push(Route::new(RouteLeg::AlternateRouter, primary));
        }
        routes
    }

    /// Quote both legs of one (amount, route) combination.
    ///
    /// `None` when a quote fails or the round trip is not strictly
    /// profitable after cost.
    async fn evaluate(
        &self,
        venue: &Venue,
        quotes: &dyn QuoteSource,
        amount_in: U256,
        route: Route,
        cost_estimate: U256,
    ) -> Option<Opportunity> {
        let intermediate = match quotes
            .quote(venue.wrapped_native, venue.stable, amount_in, route.first)
            .await
        {
            Ok(out) => out,
            Err(e) => {
                debug!(venue = %venue.id, %route, %amount_in, error = %e, "leg 1 quote failed, skipping route");
                return None;
            }
        };

        let output = match quotes
            .quote(venue.stable, venue.wrapped_native, intermediate, route.second)
            .await
        {
            Ok(out) => out,
            Err(e) => {
                debug!(venue = %venue.id, %route, %amount_in, error = %e, "leg 2 quote failed, skipping route");
                return None;
            }
        };

        // Signed math: a losing route must not underflow, only filter out
        let gross = signed_delta(output, amount_in);
        let cost = I256::try_from(cost_estimate).unwrap_or(I256::MAX);
        match gross.checked_sub(cost) {
            Some(net) if net > I256::ZERO => {}
            _ => return None,
        }

        Some(Opportunity {
            venue_id: venue.id.clone(),
            input_amount: amount_in,
            route,
            intermediate_amount: intermediate,
            output_amount: output,
            gross_profit: output - amount_in,
            cost_estimate,
            net_profit: output - amount_in - cost_estimate,
        })
    }
}
