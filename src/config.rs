//! Configuration management
//!
//! Loads settings from the environment (.env supported) with sane defaults,
//! plus an optional TOML venues file that replaces the built-in venue set.
//! Everything the scanner and engine treat as a tunable lives here — trial
//! amounts, fee tiers, gas assumptions, thresholds — so tests can inject
//! minimal fixtures instead of fighting baked-in literals.
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use crate::types::Venue;
use alloy::primitives::{
    address,
    utils::{parse_ether, parse_units},
    U256,
};
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Gas units assumed for one two-leg round trip (two V3 swaps)
const DEFAULT_ESTIMATED_GAS_UNITS: u64 = 250_000;

/// Runtime configuration assembled from env + optional venues file
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of engine iterations before the run ends
    pub iterations: u64,
    /// Delay between iterations (RPC-endpoint courtesy)
    pub iteration_delay_ms: u64,
    /// When true, the executor logs trades instead of submitting them
    pub dry_run: bool,
    /// Trading key; required only for live mode
    pub private_key: Option<String>,
    /// Minimum net profit (native smallest units) worth executing
    pub min_profit_wei: U256,
    /// Trial input sizes probed by the scanner, smallest units
    pub trial_amounts: Vec<U256>,
    /// Representative primary fee tier for alternate-router routes
    pub alternate_route_fee_tier: u32,
    /// Gas units assumed per round trip when estimating cost
    pub estimated_gas_units: u64,
    /// Gas price substituted when the live rate is unavailable
    pub gas_price_floor_wei: U256,
    /// Fixed native-asset price used for USD reporting only
    pub native_price_usd: Decimal,
    /// Optional operator webhook for stranded-trade / session alerts
    pub alert_webhook_url: Option<String>,
    /// Optional JSONL report file (one record per iteration)
    pub report_file: Option<PathBuf>,
    pub venues: Vec<Venue>,
}

/// TOML venues file: `[[venue]]` tables matching [`Venue`]
#[derive(Debug, Deserialize)]
struct VenuesFile {
    venue: Vec<Venue>,
}

/// Load configuration from the environment (and `VENUES_FILE` if set)
pub fn load_config() -> Result<Config> {
    dotenv::dotenv().ok();

    let venues = match std::env::var("VENUES_FILE") {
        Ok(path) => load_venues_file(Path::new(&path))?,
        Err(_) => default_venues(),
    };

    let config = Config {
        iterations: env_parse("ITERATIONS", 200u64)?,
        iteration_delay_ms: env_parse("ITERATION_DELAY_MS", 5000u64)?,
        dry_run: env_parse("DRY_RUN", true)?,
        private_key: std::env::var("PRIVATE_KEY").ok().filter(|k| !k.is_empty()),
        min_profit_wei: env_ether("MIN_PROFIT_ETH", "0.0001")?,
        trial_amounts: env_trial_amounts()?,
        alternate_route_fee_tier: env_parse("ALTERNATE_ROUTE_FEE_TIER", 500u32)?,
        estimated_gas_units: env_parse("ESTIMATED_GAS_UNITS", DEFAULT_ESTIMATED_GAS_UNITS)?,
        gas_price_floor_wei: env_gwei("GAS_PRICE_FLOOR_GWEI", "0.01")?,
        native_price_usd: env_parse("NATIVE_PRICE_USD", Decimal::from(3500))?,
        alert_webhook_url: std::env::var("ALERT_WEBHOOK").ok().filter(|u| !u.is_empty()),
        report_file: std::env::var("REPORT_FILE").ok().map(PathBuf::from),
        venues,
    };

    validate_config(&config)?;
    Ok(config)
}

/// Reject configurations the engine cannot run with.
///
/// This is the only place a bad setting terminates the process; at runtime
/// everything degrades to log-and-continue.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.venues.is_empty() {
        bail!("no venues configured");
    }
    if config.iterations == 0 {
        bail!("ITERATIONS must be at least 1");
    }
    if config.trial_amounts.is_empty() {
        bail!("no trial amounts configured");
    }
    if !config.dry_run && config.private_key.is_none() {
        bail!("live mode (DRY_RUN=false) requires PRIVATE_KEY");
    }
    for venue in &config.venues {
        let distinct_pairs = venue.fee_tiers.len() >= 2;
        if !distinct_pairs && !venue.has_alternate_router() {
            bail!(
                "venue {} has fewer than two fee tiers and no alternate router - nothing to scan",
                venue.id
            );
        }
        let mut sorted = venue.fee_tiers.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != venue.fee_tiers.len() {
            bail!("venue {} lists a duplicate fee tier", venue.id);
        }
    }
    Ok(())
}

/// Load a TOML venues file (`[[venue]]` tables)
pub fn load_venues_file(path: &Path) -> Result<Vec<Venue>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read venues file: {}", path.display()))?;
    let file: VenuesFile =
        toml::from_str(&content).context("failed to parse venues TOML")?;
    info!(
        path = %path.display(),
        venues = file.venue.len(),
        "loaded venues file"
    );
    Ok(file.venue)
}

/// Built-in venue set: Base, Arbitrum (with Sushi alternate router), Optimism.
///
/// RPC endpoints are public defaults; `RPC_<VENUE_ID>` env vars override them.
pub fn default_venues() -> Vec<Venue> {
    let mut venues = vec![
        Venue {
            id: "base".to_string(),
            name: "Base".to_string(),
            chain_id: 8453,
            rpc_url: "https://mainnet.base.org".to_string(),
            wrapped_native: address!("0x4200000000000000000000000000000000000006"),
            stable: address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            quoter: address!("0x3d4e44Eb1374240CE5F1B871ab261CD16335B76a"),
            router: address!("0x2626664c2603336E57B271c5C0b26F421741e481"),
            alternate_router: None,
            fee_tiers: vec![100, 500, 3000],
        },
        Venue {
            id: "arbitrum".to_string(),
            name: "Arbitrum".to_string(),
            chain_id: 42161,
            rpc_url: "https://arb1.arbitrum.io/rpc".to_string(),
            wrapped_native: address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
            stable: address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
            quoter: address!("0x61fFE014bA17989E743c5F6cB21bF9697530B21e"),
            router: address!("0x68b3465833fb72A70ecDF485E0e4C7bD8665Fc45"),
            alternate_router: Some(address!("0x1b02dA8Cb0d097eB8D57A175b88c7D8b47997506")),
            fee_tiers: vec![100, 500, 3000],
        },
        Venue {
            id: "optimism".to_string(),
            name: "Optimism".to_string(),
            chain_id: 10,
            rpc_url: "https://mainnet.optimism.io".to_string(),
            wrapped_native: address!("0x4200000000000000000000000000000000000006"),
            stable: address!("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
            quoter: address!("0x61fFE014bA17989E743c5F6cB21bF9697530B21e"),
            router: address!("0x68b3465833fb72A70ecDF485E0e4C7bD8665Fc45"),
            alternate_router: None,
            fee_tiers: vec![100, 500, 3000],
        },
    ];

    for venue in &mut venues {
        let var = format!("RPC_{}", venue.id.to_uppercase());
        if let Ok(url) = std::env::var(&var) {
            if !url.is_empty() {
                venue.rpc_url = url;
            }
        }
    }

    venues
}

/// Parse an env var, falling back to `default` when unset
fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid {name}: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Parse an env var holding an ether-denominated decimal into wei
fn env_ether(name: &str, default: &str) -> Result<U256> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    parse_ether(&raw).with_context(|| format!("invalid {name}: {raw}"))
}

/// Parse an env var holding a gwei-denominated decimal into wei
fn env_gwei(name: &str, default: &str) -> Result<U256> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = parse_units(&raw, "gwei").with_context(|| format!("invalid {name}: {raw}"))?;
    Ok(parsed.get_absolute())
}

/// `TRIAL_AMOUNTS_ETH` is a comma-separated list of ether-denominated sizes.
///
/// Default spans roughly 4x: 0.005 / 0.01 / 0.02.
fn env_trial_amounts() -> Result<Vec<U256>> {
    let raw = std::env::var("TRIAL_AMOUNTS_ETH").unwrap_or_else(|_| "0.005,0.01,0.02".to_string());
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_ether(s).with_context(|| format!("invalid trial amount: {s}")))
        .collect()
}
