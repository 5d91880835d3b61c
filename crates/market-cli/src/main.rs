//! market-analytics: momentum, factor, RSI and options analytics from the command line.
//!
//! Usage:
//!   cargo run -p market-cli -- ticker AAPL MSFT
//!   cargo run -p market-cli -- options SPY --expiration 2024-06-21
//!   cargo run -p market-cli -- snapshot us crypto --momentum
//!   cargo run -p market-cli -- markets
//!   cargo run -p market-cli -- sector technology

use std::sync::Arc;

use analysis_orchestrator::MarketAnalytics;
use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use yahoo_client::YahooClient;

mod commands;
mod config;

use commands::{entry_value, error_line, keyed_values, parse_args, Command, USAGE};
use config::CliConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", error_line(e), USAGE);
            std::process::exit(2);
        }
    };

    let config = CliConfig::from_env()?;
    tracing::debug!("Configuration loaded: {:?}", config);

    let provider = Arc::new(YahooClient::with_base_url(
        config.yahoo_base_url.clone(),
        config.request_timeout(),
    ));
    let engine = MarketAnalytics::new(provider, config.engine_config());

    let output = run(&engine, command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(engine: &MarketAnalytics, command: Command) -> Result<Value> {
    let value = match command {
        Command::Ticker { symbols } => {
            tracing::info!("Screening {} ticker(s)", symbols.len());
            // request order
            let mut screens = Vec::with_capacity(symbols.len());
            for (symbol, result) in engine.get_ticker_screen_batch(&symbols).await {
                screens.push(match result {
                    Ok(screen) => serde_json::to_value(screen)?,
                    Err(e) => Value::String(error_line(format!("{symbol}: {e}"))),
                });
            }
            Value::Array(screens)
        }
        Command::Options { symbol, expiration } => {
            entry_value(engine.get_options_data(&symbol, expiration).await)?
        }
        Command::Snapshot { categories, momentum } => {
            let snapshot = engine.get_market_snapshot(&categories, momentum).await;
            serde_json::to_value(keyed_values(snapshot)?)?
        }
        Command::Markets => {
            let now = Utc::now();
            let overview = keyed_values(engine.get_markets_data().await)?;
            serde_json::json!({
                "status": {
                    "us": engine.market_status("us", now),
                    "europe": engine.market_status("europe", now),
                    "asia": engine.market_status("asia", now),
                    "futures": engine.market_status("futures", now),
                },
                "markets": overview,
            })
        }
        Command::Sector { name } => entry_value(engine.get_sector_data(&name).await)?,
    };

    Ok(value)
}
