//! ta-report: print technical analysis reports for one or more token addresses.
//!
//! Usage:
//!   cargo run -p report-cli -- So11111111111111111111111111111111111111112
//!   cargo run -p report-cli -- --status ADDRESS_A ADDRESS_B
//!
//! Reads PRICE_FEED_API_KEY (required) and PRICE_FEED_BASE_URL (optional),
//! plus ANALYSIS_CACHE_TTL_SECS / ANALYSIS_LOOKBACK_DAYS for the orchestrator.

use analysis_orchestrator::{AnalysisConfig, AnalysisOrchestrator};
use anyhow::Context;
use futures::future::join_all;
use price_feed_client::PriceFeedClient;
use std::sync::Arc;

#[derive(Debug, PartialEq)]
struct CliArgs {
    addresses: Vec<String>,
    show_status: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let show_status = args.iter().any(|a| a == "--status");

    let mut addresses = Vec::new();
    for arg in args {
        if arg == "--status" {
            continue;
        }
        if arg.starts_with("--") {
            anyhow::bail!("Unknown option: {}", arg);
        }
        if !addresses.contains(arg) {
            addresses.push(arg.clone());
        }
    }

    if addresses.is_empty() {
        anyhow::bail!("Usage: ta-report [--status] ADDRESS [ADDRESS ...]");
    }

    Ok(CliArgs {
        addresses,
        show_status,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ta_report=info,analysis_orchestrator=info,price_feed_client=warn".into()
            }),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let api_key = std::env::var("PRICE_FEED_API_KEY").context("PRICE_FEED_API_KEY must be set")?;

    let mut client = PriceFeedClient::new(api_key);
    if let Ok(base_url) = std::env::var("PRICE_FEED_BASE_URL") {
        client = client.with_base_url(base_url);
    }

    let config = AnalysisConfig::from_env();
    tracing::info!(
        "ta-report: {} addresses, lookback={}d, cache_ttl={}s, feed={}",
        cli.addresses.len(),
        config.lookback_days,
        config.cache_ttl.as_secs(),
        client.base_url()
    );

    let orchestrator = AnalysisOrchestrator::new(Arc::new(client)).with_config(config);

    let outcomes = join_all(
        cli.addresses
            .iter()
            .map(|address| orchestrator.analyze_with_status(address)),
    )
    .await;

    for (address, outcome) in cli.addresses.iter().zip(outcomes) {
        if outcome.status.is_degraded() {
            tracing::warn!("{}: degraded report ({:?})", address, outcome.status);
        }

        let json = if cli.show_status {
            serde_json::to_string_pretty(&outcome)?
        } else {
            serde_json::to_string_pretty(&outcome.report)?
        };
        println!("{}", json);
    }

    Ok(())
}
