//! Narrow on-chain access seams
//!
//! The scanner and executor reach a venue only through these two traits, so
//! tests can drive them with canned quotes and scripted failures. Production
//! code uses [`rpc::RpcVenueClient`], one instance per venue.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

pub mod rpc;

pub use rpc::RpcVenueClient;

use crate::types::RouteLeg;
use alloy::primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Read-side access: leg quotes and the current gas rate
///
/// A `quote` error means "no usable quote for this route right now" (pool
/// absent, RPC hiccup) and is recoverable — the scanner skips the route.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Output amount for swapping `amount_in` of `token_in` into `token_out`
    /// through the pool selected by `leg`.
    async fn quote(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        leg: RouteLeg,
    ) -> Result<U256>;

    /// Current cost per gas unit in native smallest units.
    async fn gas_price(&self) -> Result<U256>;
}

/// Write-side access used by the executor
///
/// Every submitting method awaits confirmation before returning; `Err`
/// covers rejection, revert, and confirmation timeout alike.
#[async_trait]
pub trait TradeClient: Send + Sync {
    /// Trading-account balance of `token`.
    async fn balance_of(&self, token: Address) -> Result<U256>;

    /// Convert `amount` native units into the wrapped form.
    async fn wrap_native(&self, amount: U256) -> Result<()>;

    /// Allowance granted by the trading account to `spender` on `token`.
    async fn allowance(&self, token: Address, spender: Address) -> Result<U256>;

    /// Grant `spender` an unlimited allowance on `token`.
    async fn approve(&self, token: Address, spender: Address) -> Result<()>;

    /// Swap `amount_in` of `token_in` into `token_out` via `leg`, reverting
    /// unless at least `min_out` is received.
    async fn swap(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        min_out: U256,
        leg: RouteLeg,
    ) -> Result<()>;
}

/// Per-venue client pair handed to the engine
#[derive(Clone)]
pub struct VenueClients {
    pub quotes: Arc<dyn QuoteSource>,
    pub trader: Arc<dyn TradeClient>,
}
