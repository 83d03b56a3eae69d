//! Trade Executor
//!
//! Carries one chosen opportunity through the two-leg round trip: top up the
//! wrapped-native balance, approve the router, swap out, reconcile the actual
//! stable balance received, approve again if needed, swap back, and measure
//! realized profit from the final balance. Each step is a precondition for
//! the next; the first failure aborts the trade and is returned as a typed
//! reason, never raised. Dry-run mode (the default) logs the trade it would
//! place and touches nothing on chain.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use crate::chain::TradeClient;
use crate::types::{signed_delta, ExecutionFailure, ExecutionResult, Opportunity, RouteLeg, Venue};
use alloy::primitives::{Address, I256, U256};
use tracing::{error, info, warn};

/// Slippage tolerance as an integer ratio: accept at least 99.5% of a quote
const SLIPPAGE_NUM: u64 = 995;
const SLIPPAGE_DEN: u64 = 1000;

/// Minimum acceptable output for a quoted amount, floor division
pub fn min_out(quoted: U256) -> U256 {
    quoted * U256::from(SLIPPAGE_NUM) / U256::from(SLIPPAGE_DEN)
}

/// Two-leg round-trip executor
pub struct TradeExecutor {
    dry_run: bool,
}

impl TradeExecutor {
    pub fn new(dry_run: bool) -> Self {
        if dry_run {
            info!("executor in dry-run mode, no transactions will be sent");
        } else {
            warn!("executor is LIVE, trades will spend real funds");
        }
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Execute `opportunity` on `venue` through `client`.
    ///
    /// Never errors: every failure is captured in the returned result.
    /// `succeeded: true` means every step confirmed, not that the trade was
    /// profitable - the engine judges profitability afterward.
    pub async fn execute(
        &self,
        opportunity: &Opportunity,
        venue: &Venue,
        client: &dyn TradeClient,
    ) -> ExecutionResult {
        if self.dry_run {
            info!(
                venue = %venue.id,
                route = %opportunity.route,
                input = %opportunity.input_amount,
                expected_net = %opportunity.net_profit,
                "dry run: would execute round trip"
            );
            return ExecutionResult::success(
                I256::try_from(opportunity.net_profit).unwrap_or(I256::MAX),
            );
        }

        let input = opportunity.input_amount;

        // Step 1: top up wrapped-native to cover the input amount
        let wrapped_balance = match client.balance_of(venue.wrapped_native).await {
            Ok(balance) => balance,
            Err(e) => return ExecutionResult::failed(ExecutionFailure::BalanceRead(e.to_string())),
        };
        if wrapped_balance < input {
            let shortfall = input - wrapped_balance;
            if let Err(e) = client.wrap_native(shortfall).await {
                return ExecutionResult::failed(ExecutionFailure::Wrap {
                    amount: shortfall,
                    reason: e.to_string(),
                });
            }
        }

        // Step 2: leg-1 router must be able to move the input
        let leg1_spender = match Self::spender(venue, opportunity.route.first) {
            Ok(spender) => spender,
            Err(reason) => return ExecutionResult::failed(ExecutionFailure::NativeApproval(reason)),
        };
        if let Err(e) = Self::ensure_allowance(client, venue.wrapped_native, leg1_spender, input).await
        {
            return ExecutionResult::failed(ExecutionFailure::NativeApproval(e.to_string()));
        }

        // Step 3: leg 1, native -> stable
        let leg1_floor = min_out(opportunity.intermediate_amount);
        if let Err(e) = client
            .swap(
                venue.wrapped_native,
                venue.stable,
                input,
                leg1_floor,
                opportunity.route.first,
            )
            .await
        {
            return ExecutionResult::failed(ExecutionFailure::LegOne {
                leg: opportunity.route.first,
                reason: e.to_string(),
            });
        }

        // Step 4: the quoted intermediate is stale the moment leg 1 lands;
        // leg 2 trades what the account actually holds
        let stable_balance = match client.balance_of(venue.stable).await {
            Ok(balance) => balance,
            Err(e) => {
                return self
                    .fail_stranded(venue, ExecutionFailure::IntermediateRead(e.to_string()))
            }
        };

        // Step 5: leg-2 router must be able to move the actual balance
        let leg2_spender = match Self::spender(venue, opportunity.route.second) {
            Ok(spender) => spender,
            Err(reason) => {
                return self.fail_stranded(venue, ExecutionFailure::StableApproval(reason))
            }
        };
        if let Err(e) =
            Self::ensure_allowance(client, venue.stable, leg2_spender, stable_balance).await
        {
            return self.fail_stranded(venue, ExecutionFailure::StableApproval(e.to_string()));
        }

        // Step 6: leg 2, stable -> native
        let leg2_floor = min_out(opportunity.output_amount);
        if let Err(e) = client
            .swap(
                venue.stable,
                venue.wrapped_native,
                stable_balance,
                leg2_floor,
                opportunity.route.second,
            )
            .await
        {
            return self.fail_stranded(
                venue,
                ExecutionFailure::LegTwo {
                    leg: opportunity.route.second,
                    reason: e.to_string(),
                },
            );
        }

        // Step 7: realized profit from the final balance, signed
        let final_balance = match client.balance_of(venue.wrapped_native).await {
            Ok(balance) => balance,
            Err(e) => return ExecutionResult::failed(ExecutionFailure::FinalRead(e.to_string())),
        };
        let realized = signed_delta(final_balance, input);
        info!(
            venue = %venue.id,
            route = %opportunity.route,
            %realized,
            "round trip complete"
        );
        ExecutionResult::success(realized)
    }

    /// Router that moves tokens for this leg
    fn spender(venue: &Venue, leg: RouteLeg) -> Result<Address, String> {
        match leg {
            RouteLeg::FeeTier(_) => Ok(venue.router),
            RouteLeg::AlternateRouter => venue
                .alternate_router
                .ok_or_else(|| format!("venue {} has no alternate router", venue.id)),
        }
    }

    /// Approve `spender` on `token` unless the allowance already covers `needed`
    async fn ensure_allowance(
        client: &dyn TradeClient,
        token: Address,
        spender: Address,
        needed: U256,
    ) -> anyhow::Result<()> {
        let current = client.allowance(token, spender).await?;
        if current < needed {
            client.approve(token, spender).await?;
        }
        Ok(())
    }

    /// Failure after leg 1 confirmed: the account holds the stable asset.
    fn fail_stranded(&self, venue: &Venue, failure: ExecutionFailure) -> ExecutionResult {
        error!(
            venue = %venue.id,
            reason = %failure,
            "round trip aborted after leg 1 - account holds the intermediate asset, manual intervention required"
        );
        ExecutionResult::failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Route;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const WETH: Address = Address::repeat_byte(0x11);
    const USDC: Address = Address::repeat_byte(0x22);

    fn test_venue() -> Venue {
        Venue {
            id: "base".to_string(),
            name: "Base".to_string(),
            chain_id: 8453,
            rpc_url: String::new(),
            wrapped_native: WETH,
            stable: USDC,
            quoter: Address::repeat_byte(0x33),
            router: Address::repeat_byte(0x44),
            alternate_router: None,
            fee_tiers: vec![500, 3000],
        }
    }

    fn test_opportunity() -> Opportunity {
        Opportunity {
            venue_id: "base".to_string(),
            input_amount: U256::from(1_000_000u64),
            route: Route::new(RouteLeg::FeeTier(500), RouteLeg::FeeTier(3000)),
            intermediate_amount: U256::from(1_000_001u64),
            output_amount: U256::from(2_000_003u64),
            gross_profit: U256::from(1_000_003u64),
            cost_estimate: U256::from(1_000u64),
            net_profit: U256::from(999_003u64),
        }
    }

    /// Scripted client: queued balance reads, fixed allowance, optional
    /// failure on the nth swap, and a log of every call made.
    struct MockClient {
        balances: Mutex<Vec<U256>>,
        allowance: U256,
        fail_swap: Option<usize>,
        swap_count: AtomicUsize,
        calls: Mutex<Vec<String>>,
        min_outs: Mutex<Vec<U256>>,
    }

    impl MockClient {
        fn new(balances: Vec<u64>, allowance: u64, fail_swap: Option<usize>) -> Self {
            Self {
                balances: Mutex::new(balances.into_iter().map(U256::from).collect()),
                allowance: U256::from(allowance),
                fail_swap,
                swap_count: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
                min_outs: Mutex::new(Vec::new()),
            }
        }

        fn log(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TradeClient for MockClient {
        async fn balance_of(&self, _token: Address) -> Result<U256> {
            self.log("balance_of");
            let mut balances = self.balances.lock().unwrap();
            if balances.is_empty() {
                bail!("no scripted balance left");
            }
            Ok(balances.remove(0))
        }

        async fn wrap_native(&self, amount: U256) -> Result<()> {
            self.log(&format!("wrap:{amount}"));
            Ok(())
        }

        async fn allowance(&self, _token: Address, _spender: Address) -> Result<U256> {
            self.log("allowance");
            Ok(self.allowance)
        }

        async fn approve(&self, _token: Address, _spender: Address) -> Result<()> {
            self.log("approve");
            Ok(())
        }

        async fn swap(
            &self,
            _token_in: Address,
            _token_out: Address,
            _amount_in: U256,
            min_out: U256,
            _leg: RouteLeg,
        ) -> Result<()> {
            let n = self.swap_count.fetch_add(1, Ordering::SeqCst) + 1;
            self.log(&format!("swap{n}"));
            self.min_outs.lock().unwrap().push(min_out);
            if self.fail_swap == Some(n) {
                bail!("execution reverted");
            }
            Ok(())
        }
    }

    #[test]
    fn min_out_floors_at_995_per_1000() {
        // 1_000_001 * 995 / 1000 = 995_000.995 -> floor 995_000
        assert_eq!(min_out(U256::from(1_000_001u64)), U256::from(995_000u64));
        assert_eq!(min_out(U256::from(1_000_000u64)), U256::from(995_000u64));
        assert_eq!(min_out(U256::ZERO), U256::ZERO);
    }

    #[tokio::test]
    async fn happy_path_reports_realized_profit_from_final_balance() {
        // balances: wrapped before (covers input), stable after leg 1,
        // wrapped after leg 2
        let client = MockClient::new(vec![1_000_000, 1_000_100, 1_000_900], u64::MAX, None);
        let executor = TradeExecutor::new(false);
        let result = executor.execute(&test_opportunity(), &test_venue(), &client).await;

        assert!(result.succeeded);
        assert_eq!(result.realized_profit, I256::try_from(900i64).unwrap());
        assert!(result.failure.is_none());

        // Slippage floors: exact integer floor division on both legs
        let min_outs = client.min_outs.lock().unwrap().clone();
        assert_eq!(min_outs, vec![U256::from(995_000u64), U256::from(1_990_002u64)]);
    }

    #[tokio::test]
    async fn shortfall_is_wrapped_exactly() {
        let client = MockClient::new(vec![400_000, 1_000_100, 1_001_000], u64::MAX, None);
        let executor = TradeExecutor::new(false);
        let result = executor.execute(&test_opportunity(), &test_venue(), &client).await;

        assert!(result.succeeded);
        assert!(client.calls().contains(&"wrap:600000".to_string()));
    }

    #[tokio::test]
    async fn sufficient_balance_and_allowance_skip_wrap_and_approve() {
        let client = MockClient::new(vec![2_000_000, 1_000_100, 1_001_000], u64::MAX, None);
        let executor = TradeExecutor::new(false);
        let result = executor.execute(&test_opportunity(), &test_venue(), &client).await;

        assert!(result.succeeded);
        let calls = client.calls();
        assert!(!calls.iter().any(|c| c.starts_with("wrap")));
        assert!(!calls.contains(&"approve".to_string()));
    }

    #[tokio::test]
    async fn low_allowance_triggers_approval_before_each_leg() {
        let client = MockClient::new(vec![2_000_000, 1_000_100, 1_001_000], 0, None);
        let executor = TradeExecutor::new(false);
        let result = executor.execute(&test_opportunity(), &test_venue(), &client).await;

        assert!(result.succeeded);
        let approvals = client.calls().iter().filter(|c| *c == "approve").count();
        assert_eq!(approvals, 2);
    }

    #[tokio::test]
    async fn leg_one_failure_is_not_stranded() {
        let client = MockClient::new(vec![2_000_000], u64::MAX, Some(1));
        let executor = TradeExecutor::new(false);
        let result = executor.execute(&test_opportunity(), &test_venue(), &client).await;

        assert!(!result.succeeded);
        let failure = result.failure.unwrap();
        assert!(matches!(failure, ExecutionFailure::LegOne { .. }));
        assert!(!failure.stranded());
    }

    #[tokio::test]
    async fn leg_two_failure_is_stranded_and_aborts_without_retry() {
        let client = MockClient::new(vec![2_000_000, 1_000_100], u64::MAX, Some(2));
        let executor = TradeExecutor::new(false);
        let result = executor.execute(&test_opportunity(), &test_venue(), &client).await;

        assert!(!result.succeeded);
        assert_eq!(result.realized_profit, I256::ZERO);
        let failure = result.failure.unwrap();
        assert!(matches!(failure, ExecutionFailure::LegTwo { .. }));
        assert!(failure.stranded());

        // No retry: exactly two swap submissions happened
        assert_eq!(client.swap_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unprofitable_but_complete_round_trip_still_succeeds() {
        // Final balance below input: realized profit negative, succeeded true
        let client = MockClient::new(vec![1_000_000, 1_000_100, 998_000], u64::MAX, None);
        let executor = TradeExecutor::new(false);
        let result = executor.execute(&test_opportunity(), &test_venue(), &client).await;

        assert!(result.succeeded);
        assert_eq!(result.realized_profit, I256::try_from(-2_000i64).unwrap());
    }

    #[tokio::test]
    async fn dry_run_touches_nothing_and_echoes_the_estimate() {
        let client = MockClient::new(vec![], 0, None);
        let executor = TradeExecutor::new(true);
        let opportunity = test_opportunity();
        let result = executor.execute(&opportunity, &test_venue(), &client).await;

        assert!(result.succeeded);
        assert_eq!(
            result.realized_profit,
            I256::try_from(opportunity.net_profit).unwrap()
        );
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn alternate_leg_without_alternate_router_fails_cleanly() {
        let client = MockClient::new(vec![2_000_000], u64::MAX, None);
        let executor = TradeExecutor::new(false);
        let mut opportunity = test_opportunity();
        opportunity.route = Route::new(RouteLeg::AlternateRouter, RouteLeg::FeeTier(500));

        let result = executor.execute(&opportunity, &test_venue(), &client).await;
        assert!(!result.succeeded);
        assert!(matches!(
            result.failure.unwrap(),
            ExecutionFailure::NativeApproval(_)
        ));
    }
}
