//! alloy-backed venue client
//!
//! Implements both access traits against a live RPC endpoint: QuoterV2
//! static calls and V2 `getAmountsOut` for quoting, SwapRouter02 /
//! V2-router / WETH9 / ERC-20 transactions for trading. One instance is
//! bound to one venue and one trading account.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use crate::chain::{QuoteSource, TradeClient};
use crate::contracts::{IQuoterV2, ISwapRouter02, IUniswapV2Router02, IWETH9, IERC20};
use crate::types::{RouteLeg, Venue};
use alloy::primitives::{Address, Uint, U256};
use alloy::providers::Provider;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// How long to wait for a confirmation before treating the step as failed
const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(90);

/// Deadline slack for V2-router swaps
const V2_DEADLINE_SLACK_SECS: u64 = 300;

/// Convert a fee tier to the uint24 the V3 contracts expect
fn fee_to_u24(fee: u32) -> Uint<24, 1> {
    debug_assert!(fee < (1 << 24), "fee tier must fit in uint24");
    Uint::from_limbs([fee as u64])
}

/// Deadline for V2-router swaps, a fixed slack past the current time
fn v2_deadline() -> U256 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    U256::from(now + V2_DEADLINE_SLACK_SECS)
}

/// One venue's RPC access: quoting for the scanner, trading for the executor
pub struct RpcVenueClient<P> {
    provider: Arc<P>,
    venue: Venue,
    /// Trading account: swap recipient and balance owner
    account: Address,
    confirm_timeout: Duration,
}

impl<P: Provider + 'static> RpcVenueClient<P> {
    pub fn new(provider: Arc<P>, venue: Venue, account: Address) -> Self {
        Self {
            provider,
            venue,
            account,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    pub fn venue_id(&self) -> &str {
        &self.venue.id
    }

    fn alternate_router(&self) -> Result<Address> {
        self.venue
            .alternate_router
            .with_context(|| format!("venue {} has no alternate router", self.venue.id))
    }
}

#[async_trait]
impl<P: Provider + 'static> QuoteSource for RpcVenueClient<P> {
    async fn quote(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        leg: RouteLeg,
    ) -> Result<U256> {
        match leg {
            RouteLeg::FeeTier(fee) => {
                let quoter = IQuoterV2::new(self.venue.quoter, self.provider.clone());
                let params = IQuoterV2::QuoteExactInputSingleParams {
                    tokenIn: token_in,
                    tokenOut: token_out,
                    amountIn: amount_in,
                    fee: fee_to_u24(fee),
                    sqrtPriceLimitX96: Uint::<160, 3>::ZERO,
                };
                let quoted = quoter
                    .quoteExactInputSingle(params)
                    .call()
                    .await
                    .with_context(|| {
                        format!("quoter call failed on {} (fee {})", self.venue.id, fee)
                    })?;
                Ok(quoted.amountOut)
            }
            RouteLeg::AlternateRouter => {
                let router =
                    IUniswapV2Router02::new(self.alternate_router()?, self.provider.clone());
                let amounts = router
                    .getAmountsOut(amount_in, vec![token_in, token_out])
                    .call()
                    .await
                    .with_context(|| format!("getAmountsOut failed on {}", self.venue.id))?;
                amounts
                    .last()
                    .copied()
                    .context("getAmountsOut returned an empty path")
            }
        }
    }

    async fn gas_price(&self) -> Result<U256> {
        let price = self
            .provider
            .get_gas_price()
            .await
            .with_context(|| format!("gas price fetch failed on {}", self.venue.id))?;
        Ok(U256::from(price))
    }
}

#[async_trait]
impl<P: Provider + 'static> TradeClient for RpcVenueClient<P> {
    async fn balance_of(&self, token: Address) -> Result<U256> {
        let erc20 = IERC20::new(token, self.provider.clone());
        erc20
            .balanceOf(self.account)
            .call()
            .await
            .with_context(|| format!("balanceOf({token}) failed on {}", self.venue.id))
    }

    async fn wrap_native(&self, amount: U256) -> Result<()> {
        let weth = IWETH9::new(self.venue.wrapped_native, self.provider.clone());
        let receipt = weth
            .deposit()
            .value(amount)
            .send()
            .await
            .context("wrap submission failed")?
            .with_timeout(Some(self.confirm_timeout))
            .get_receipt()
            .await
            .context("wrap confirmation failed")?;
        if !receipt.status() {
            bail!("wrap reverted: {}", receipt.transaction_hash);
        }
        debug!(venue = %self.venue.id, %amount, tx = %receipt.transaction_hash, "wrapped native");
        Ok(())
    }

    async fn allowance(&self, token: Address, spender: Address) -> Result<U256> {
        let erc20 = IERC20::new(token, self.provider.clone());
        erc20
            .allowance(self.account, spender)
            .call()
            .await
            .with_context(|| format!("allowance({token}) read failed on {}", self.venue.id))
    }

    async fn approve(&self, token: Address, spender: Address) -> Result<()> {
        let erc20 = IERC20::new(token, self.provider.clone());
        let receipt = erc20
            .approve(spender, U256::MAX)
            .send()
            .await
            .context("approve submission failed")?
            .with_timeout(Some(self.confirm_timeout))
            .get_receipt()
            .await
            .context("approve confirmation failed")?;
        if !receipt.status() {
            bail!("approve reverted: {}", receipt.transaction_hash);
        }
        debug!(venue = %self.venue.id, %token, %spender, "approval granted");
        Ok(())
    }

    async fn swap(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        min_out: U256,
        leg: RouteLeg,
    ) -> Result<()> {
        let (tx_hash, status) = match leg {
            RouteLeg::FeeTier(fee) => {
                let router = ISwapRouter02::new(self.venue.router, self.provider.clone());
                let params = ISwapRouter02::ExactInputSingleParams {
                    tokenIn: token_in,
                    tokenOut: token_out,
                    fee: fee_to_u24(fee),
                    recipient: self.account,
                    amountIn: amount_in,
                    amountOutMinimum: min_out,
                    sqrtPriceLimitX96: Uint::<160, 3>::ZERO,
                };
                let receipt = router
                    .exactInputSingle(params)
                    .send()
                    .await
                    .context("swap submission failed")?
                    .with_timeout(Some(self.confirm_timeout))
                    .get_receipt()
                    .await
                    .context("swap confirmation failed")?;
                (receipt.transaction_hash, receipt.status())
            }
            RouteLeg::AlternateRouter => {
                let router =
                    IUniswapV2Router02::new(self.alternate_router()?, self.provider.clone());
                let receipt = router
                    .swapExactTokensForTokens(
                        amount_in,
                        min_out,
                        vec![token_in, token_out],
                        self.account,
                        v2_deadline(),
                    )
                    .send()
                    .await
                    .context("swap submission failed")?
                    .with_timeout(Some(self.confirm_timeout))
                    .get_receipt()
                    .await
                    .context("swap confirmation failed")?;
                (receipt.transaction_hash, receipt.status())
            }
        };

        if !status {
            bail!("swap reverted: {tx_hash}");
        }
        debug!(venue = %self.venue.id, %amount_in, %min_out, leg = %leg, tx = %tx_hash, "swap confirmed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_tiers_fit_in_uint24() {
        assert_eq!(fee_to_u24(500), Uint::<24, 1>::from(500u32));
        assert_eq!(fee_to_u24(3000), Uint::<24, 1>::from(3000u32));
    }

    #[test]
    fn v2_deadline_is_in_the_future() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert!(v2_deadline() > U256::from(now));
    }
}
