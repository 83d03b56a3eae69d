// Core data structures shared across the bot

use alloy::primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One venue: a chain plus its DEX endpoints, scanned and traded as a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    /// Short identifier used in logs, records, and bandit arms
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    /// Wrapped native asset (WETH-style, 18 decimals)
    pub wrapped_native: Address,
    /// Stable asset (USDC-style)
    pub stable: Address,
    /// QuoterV2 for concentrated-liquidity quotes
    pub quoter: Address,
    /// Primary swap router (SwapRouter02-style)
    pub router: Address,
    /// Optional V2-style router used as an alternate price source
    pub alternate_router: Option<Address>,
    /// Fee tiers paired up when scanning the primary router
    pub fee_tiers: Vec<u32>,
}

impl Venue {
    pub fn has_alternate_router(&self) -> bool {
        self.alternate_router.is_some()
    }
}

/// Pool selector for one leg of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteLeg {
    /// Concentrated-liquidity pool on the primary router at this fee tier
    FeeTier(u32),
    /// The venue's alternate (V2-style) router
    AlternateRouter,
}

impl fmt::Display for RouteLeg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RouteLeg::FeeTier(fee) => write!(f, "{}%", *fee as f64 / 10000.0),
            RouteLeg::AlternateRouter => write!(f, "alt-router"),
        }
    }
}

/// Ordered leg pair forming a round trip (native -> stable -> native)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub first: RouteLeg,
    pub second: RouteLeg,
}

impl Route {
    pub fn new(first: RouteLeg, second: RouteLeg) -> Self {
        Self { first, second }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "native->{}->stable->{}->native", self.first, self.second)
    }
}

/// One profitable round trip found by a scan
///
/// All amounts are smallest-unit integers. `net_profit > 0` by construction;
/// the scanner never emits anything else.
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub venue_id: String,
    pub input_amount: U256,
    pub route: Route,
    /// Quoted stable output of leg 1 (leg-2 input at quote time)
    pub intermediate_amount: U256,
    /// Quoted native output of leg 2
    pub output_amount: U256,
    /// output - input
    pub gross_profit: U256,
    /// Estimated round-trip transaction cost in native smallest units
    pub cost_estimate: U256,
    /// gross - cost
    pub net_profit: U256,
}

/// Step at which an execution attempt aborted
///
/// Every variant names the protocol step so the operator can tell from the
/// reason string alone how far the trade got.
#[derive(Debug, Clone, Error)]
pub enum ExecutionFailure {
    #[error("wrapped-native balance read failed: {0}")]
    BalanceRead(String),
    #[error("wrapping {amount} native units failed: {reason}")]
    Wrap { amount: U256, reason: String },
    #[error("router approval for wrapped-native failed: {0}")]
    NativeApproval(String),
    #[error("leg 1 ({leg}) failed: {reason}")]
    LegOne { leg: RouteLeg, reason: String },
    #[error("intermediate stable balance read failed: {0}")]
    IntermediateRead(String),
    #[error("router approval for stable failed: {0}")]
    StableApproval(String),
    #[error("leg 2 ({leg}) failed: {reason}")]
    LegTwo { leg: RouteLeg, reason: String },
    #[error("final wrapped-native balance read failed: {0}")]
    FinalRead(String),
}

impl ExecutionFailure {
    /// True when the abort happened after leg 1 confirmed: the round trip is
    /// incomplete and the account is left holding the stable asset.
    pub fn stranded(&self) -> bool {
        matches!(
            self,
            ExecutionFailure::IntermediateRead(_)
                | ExecutionFailure::StableApproval(_)
                | ExecutionFailure::LegTwo { .. }
        )
    }
}

/// Outcome of one execution attempt
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// True when every protocol step confirmed. Execution success and trade
    /// profitability are separate facts; the engine judges the latter.
    pub succeeded: bool,
    /// Final wrapped-native balance minus input amount (signed)
    pub realized_profit: I256,
    pub failure: Option<ExecutionFailure>,
}

impl ExecutionResult {
    pub fn success(realized_profit: I256) -> Self {
        Self {
            succeeded: true,
            realized_profit,
            failure: None,
        }
    }

    pub fn failed(failure: ExecutionFailure) -> Self {
        Self {
            succeeded: false,
            realized_profit: I256::ZERO,
            failure: Some(failure),
        }
    }

    pub fn failure_reason(&self) -> Option<String> {
        self.failure.as_ref().map(|f| f.to_string())
    }
}

/// `minuend - subtrahend` as a signed value
///
/// Token balances fit comfortably inside I256; the saturating fallback exists
/// only to keep the conversion total.
pub fn signed_delta(minuend: U256, subtrahend: U256) -> I256 {
    if minuend >= subtrahend {
        I256::try_from(minuend - subtrahend).unwrap_or(I256::MAX)
    } else {
        I256::try_from(subtrahend - minuend)
            .map(|v| -v)
            .unwrap_or(I256::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_display_names_both_legs() {
        let route = Route::new(RouteLeg::FeeTier(500), RouteLeg::FeeTier(3000));
        assert_eq!(route.to_string(), "native->0.05%->stable->0.3%->native");

        let cross = Route::new(RouteLeg::AlternateRouter, RouteLeg::FeeTier(500));
        assert_eq!(cross.to_string(), "native->alt-router->stable->0.05%->native");
    }

    #[test]
    fn signed_delta_handles_both_signs() {
        let big = U256::from(1_000_000u64);
        let small = U256::from(999_000u64);
        assert_eq!(signed_delta(big, small), I256::try_from(1_000i64).unwrap());
        assert_eq!(signed_delta(small, big), I256::try_from(-1_000i64).unwrap());
        assert_eq!(signed_delta(big, big), I256::ZERO);
    }

    #[test]
    fn stranded_covers_exactly_the_post_leg1_steps() {
        let leg = RouteLeg::FeeTier(500);
        assert!(!ExecutionFailure::BalanceRead("x".into()).stranded());
        assert!(!ExecutionFailure::Wrap {
            amount: U256::from(1u64),
            reason: "x".into()
        }
        .stranded());
        assert!(!ExecutionFailure::NativeApproval("x".into()).stranded());
        assert!(!ExecutionFailure::LegOne {
            leg,
            reason: "x".into()
        }
        .stranded());
        assert!(ExecutionFailure::IntermediateRead("x".into()).stranded());
        assert!(ExecutionFailure::StableApproval("x".into()).stranded());
        assert!(ExecutionFailure::LegTwo {
            leg,
            reason: "x".into()
        }
        .stranded());
        // Leg 2 confirmed; the account holds native again even if the read failed.
        assert!(!ExecutionFailure::FinalRead("x".into()).stranded());
    }
}
