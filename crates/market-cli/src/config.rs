use std::env;
use std::time::Duration;

use analysis_orchestrator::{EngineConfig, DEFAULT_MARKET_SYMBOL};
use anyhow::{bail, Context, Result};

/// Runtime settings for the command line tool, read from the environment
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub yahoo_base_url: String,
    pub request_timeout_seconds: u64,

    pub pool_width: usize,
    pub market_symbol: String,
    pub rsi_period: usize,
    pub price_window_days: i64,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            yahoo_base_url: var("YAHOO_BASE_URL", yahoo_client::DEFAULT_BASE_URL),
            request_timeout_seconds: var("YAHOO_TIMEOUT_SECS", "30")
                .parse()
                .context("YAHOO_TIMEOUT_SECS must be a whole number of seconds")?,

            pool_width: var("FETCH_POOL_WIDTH", "10")
                .parse()
                .context("FETCH_POOL_WIDTH must be a positive integer")?,
            market_symbol: var("MARKET_INDEX_SYMBOL", DEFAULT_MARKET_SYMBOL),
            rsi_period: var("RSI_PERIOD", "14")
                .parse()
                .context("RSI_PERIOD must be a positive integer")?,
            price_window_days: var("PRICE_WINDOW_DAYS", "5")
                .parse()
                .context("PRICE_WINDOW_DAYS must be an integer")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pool_width == 0 {
            bail!("FETCH_POOL_WIDTH must be at least 1");
        }
        if self.rsi_period == 0 {
            bail!("RSI_PERIOD must be at least 1");
        }
        if self.price_window_days < 0 {
            bail!("PRICE_WINDOW_DAYS cannot be negative");
        }
        if self.market_symbol.trim().is_empty() {
            bail!("MARKET_INDEX_SYMBOL cannot be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            pool_width: self.pool_width,
            market_symbol: self.market_symbol.clone(),
            rsi_period: self.rsi_period,
            price_window_days: self.price_window_days,
            ..EngineConfig::default()
        }
    }
}
