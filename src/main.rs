//! Multi-Chain Round-Trip Arbitrage Bot
//!
//! Main entry point. Loads configuration, builds one RPC client per venue,
//! and hands everything to the engine: a Thompson-sampling bandit picks
//! which venue to scan each iteration, the scanner enumerates WETH->USDC->
//! WETH round trips across fee-tier pairs, and the executor runs the best
//! find as a two-leg swap with slippage floors. Dry-run by default; live
//! trading needs --live (or DRY_RUN=false) plus a funded PRIVATE_KEY.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use alloy::network::EthereumWallet;
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use multiarb_bot::alert::OperatorAlerter;
use multiarb_bot::report::{JsonlSink, LogSink, ReportSink};
use multiarb_bot::{
    config, load_config, ArbEngine, EngineConfig, OpportunityScanner, RpcVenueClient,
    ScannerConfig, TradeExecutor, VenueClients,
};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "multiarb-bot", about = "Multi-chain round-trip arbitrage bot")]
struct Args {
    /// Iterations to run (overrides ITERATIONS)
    #[arg(long)]
    iterations: Option<u64>,

    /// TOML venues file replacing the built-in Base/Arbitrum/Optimism set
    #[arg(long)]
    venues_file: Option<PathBuf>,

    /// Enable live trading (default is dry run; requires PRIVATE_KEY)
    #[arg(long)]
    live: bool,

    /// Append a JSONL report (one record per iteration) to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = load_config().context("failed to load configuration")?;
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if args.live {
        config.dry_run = false;
    }
    if let Some(path) = &args.report {
        config.report_file = Some(path.clone());
    }
    if let Some(path) = &args.venues_file {
        config.venues = config::load_venues_file(path)?;
    }
    config::validate_config(&config).context("configuration rejected")?;

    info!("===========================================");
    info!("   Multi-Chain Round-Trip Arbitrage Bot");
    info!("   Thompson-Sampling Venue Rotation");
    info!("===========================================");
    info!(
        venues = config.venues.len(),
        iterations = config.iterations,
        dry_run = config.dry_run,
        min_profit_wei = %config.min_profit_wei,
        "configuration loaded"
    );

    // Live mode signs with the configured key; dry runs only read the chain,
    // so a throwaway signer satisfies the provider.
    let signer: PrivateKeySigner = match &config.private_key {
        Some(key) => key.parse().context("invalid PRIVATE_KEY")?,
        None => PrivateKeySigner::random(),
    };
    let wallet = EthereumWallet::from(signer);
    let account = wallet.default_signer().address();
    info!(%account, "trading account");

    let mut clients = HashMap::new();
    for venue in &config.venues {
        let url = venue
            .rpc_url
            .parse()
            .with_context(|| format!("invalid RPC URL for venue {}", venue.id))?;
        let provider = ProviderBuilder::new().wallet(wallet.clone()).connect_http(url);
        let client = Arc::new(RpcVenueClient::new(
            Arc::new(provider),
            venue.clone(),
            account,
        ));
        clients.insert(
            venue.id.clone(),
            VenueClients {
                quotes: client.clone(),
                trader: client,
            },
        );
        info!(venue = %venue.id, chain_id = venue.chain_id, "venue client ready");
    }

    let scanner = OpportunityScanner::new(ScannerConfig {
        trial_amounts: config.trial_amounts.clone(),
        alternate_route_fee_tier: config.alternate_route_fee_tier,
        estimated_gas_units: config.estimated_gas_units,
        gas_price_floor_wei: config.gas_price_floor_wei,
    });
    let executor = TradeExecutor::new(config.dry_run);

    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(LogSink)];
    if let Some(path) = &config.report_file {
        sinks.push(Box::new(JsonlSink::new(path)?));
        info!(report = %path.display(), "JSONL report enabled");
    }

    let engine_config = EngineConfig {
        iterations: config.iterations,
        iteration_delay: Duration::from_millis(config.iteration_delay_ms),
        min_profit_wei: config.min_profit_wei,
        native_price_usd: config.native_price_usd,
    };
    let mut engine = ArbEngine::new(
        engine_config,
        config.venues.clone(),
        clients,
        scanner,
        executor,
    )
    .with_sinks(sinks)
    .with_alerter(OperatorAlerter::new(config.alert_webhook_url.clone()));

    // SIGINT/SIGTERM end the run at the next iteration boundary; the
    // session summary is still emitted.
    let shutdown = engine.shutdown_flag();
    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    let signals_handle = signals.handle();
    tokio::spawn(async move {
        while let Some(signal) = signals.next().await {
            info!(signal, "shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
        }
    });

    let summary = engine.run().await.context("engine run failed")?;
    signals_handle.close();

    info!(
        iterations = summary.iterations,
        trades = summary.trades,
        successful = summary.successful_trades,
        profit_wei = %summary.cumulative_profit_wei,
        "run finished"
    );
    Ok(())
}
