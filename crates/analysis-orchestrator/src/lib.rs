use std::collections::HashMap;
use std::sync::Arc;

use analysis_core::{
    normalize_ticker_symbol, AnalysisError, ExpirationSelector, FactorResult, MomentumResult,
    QuoteProvider, SymbolCatalog,
};
use chrono::{DateTime, Utc};
use options_analytics::OptionsAnalytics;

pub mod history;
pub mod market_hours;
pub mod markets;
pub mod metrics;
pub mod options;
pub mod pool;
pub mod records;

#[cfg(test)]
mod test_support;

pub use history::{date_range, fetch_price_at_date, fetch_price_history, DEFAULT_MARKET_SYMBOL};
pub use pool::{fan_out, DEFAULT_POOL_WIDTH};
pub use records::*;

/// Holdings shown on the sector drill-down
const SECTOR_TOP_HOLDINGS: usize = 10;

/// Tunables for the analytics services
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Concurrent provider jobs per fan-out
    pub pool_width: usize,
    /// Market proxy for factor regressions
    pub market_symbol: String,
    pub rsi_period: usize,
    /// Days searched either side of a momentum anchor date
    pub price_window_days: i64,
    pub factor_months: u32,
    /// History used for the screen's RSI
    pub screen_history_months: u32,
    pub hist_vol_months: u32,
    pub iv_range_months: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_width: DEFAULT_POOL_WIDTH,
            market_symbol: DEFAULT_MARKET_SYMBOL.to_string(),
            rsi_period: technical_analysis::DEFAULT_RSI_PERIOD,
            price_window_days: technical_analysis::DEFAULT_WINDOW_DAYS,
            factor_months: 12,
            screen_history_months: 1,
            hist_vol_months: 3,
            iv_range_months: 13,
        }
    }
}

/// Entry point for every analytics operation.
///
/// Holds no state between calls: each request goes back to the provider.
#[derive(Clone)]
pub struct MarketAnalytics {
    provider: Arc<dyn QuoteProvider>,
    catalog: &'static SymbolCatalog,
    config: Arc<EngineConfig>,
}

impl MarketAnalytics {
    pub fn new(provider: Arc<dyn QuoteProvider>, config: EngineConfig) -> Self {
        Self {
            provider,
            catalog: SymbolCatalog::standard(),
            config: Arc::new(config),
        }
    }

    pub async fn calculate_momentum(&self, symbol: &str) -> MomentumResult {
        let symbol = normalize_ticker_symbol(symbol);
        metrics::calculate_momentum(
            self.provider.as_ref(),
            &symbol,
            Utc::now(),
            self.config.price_window_days,
        )
        .await
    }

    pub async fn calculate_idio_vol(&self, symbol: &str) -> FactorResult {
        let symbol = normalize_ticker_symbol(symbol);
        tracing::info!("Factor decomposition for {} vs {}", symbol, self.config.market_symbol);
        metrics::calculate_idio_vol(
            self.provider.as_ref(),
            &symbol,
            self.config.factor_months,
            &self.config.market_symbol,
        )
        .await
    }

    /// Full options analytics for one expiration plus term structure,
    /// per-expiration summary and historical IV context.
    pub async fn get_options_data(
        &self,
        symbol: &str,
        selector: ExpirationSelector,
    ) -> Result<OptionsAnalytics, AnalysisError> {
        let symbol = normalize_ticker_symbol(symbol);
        tracing::info!("Options analytics for {} ({:?})", symbol, selector);
        options::options_analytics(&self.provider, &symbol, selector, &self.config, Utc::now()).await
    }

    /// Quotes (and optionally momentum) for market categories, keyed by
    /// catalog key. With no categories the default set depends on whether
    /// the US session is open.
    pub async fn get_market_snapshot(
        &self,
        categories: &[String],
        show_momentum: bool,
    ) -> HashMap<String, Result<TickerSnapshot, AnalysisError>> {
        let now = Utc::now();
        let categories: Vec<String> = if categories.is_empty() {
            self.catalog
                .default_snapshot_categories(market_hours::is_us_market_open(now))
                .into_iter()
                .map(String::from)
                .collect()
        } else {
            categories.to_vec()
        };

        let keys = markets::resolve_snapshot_keys(self.catalog, &categories);
        tracing::info!("Market snapshot: {} symbols", keys.len());

        let catalog = self.catalog;
        let results = fan_out(keys, self.config.pool_width, |key: &'static str| {
            let provider = Arc::clone(&self.provider);
            let config = Arc::clone(&self.config);
            async move {
                let symbol = catalog.market_symbol(key).ok_or_else(|| {
                    AnalysisError::InvalidInput(format!("Unknown market key: {}", key))
                })?;
                let mut snapshot =
                    markets::fetch_ticker_snapshot(provider.as_ref(), symbol, show_momentum, &config, now)
                        .await?;
                // catalog names win over provider names
                if let Some(name) = catalog.display_name(key) {
                    snapshot.name = Some(name.to_string());
                }
                Ok(snapshot)
            }
        })
        .await;

        results
            .into_iter()
            .map(|(key, result)| (key.to_string(), result))
            .collect()
    }

    /// The fixed markets overview: quote, change and 1M/1Y momentum per key
    pub async fn get_markets_data(&self) -> HashMap<String, Result<MarketOverviewEntry, AnalysisError>> {
        let now = Utc::now();
        let catalog = self.catalog;
        let keys = catalog.overview_keys().iter().copied();
        tracing::info!("Markets overview: {} symbols", catalog.overview_keys().len());

        let results = fan_out(keys, self.config.pool_width, |key: &'static str| {
            let provider = Arc::clone(&self.provider);
            let config = Arc::clone(&self.config);
            async move {
                let symbol = catalog.market_symbol(key).ok_or_else(|| {
                    AnalysisError::InvalidInput(format!("Unknown market key: {}", key))
                })?;
                markets::fetch_overview_entry(provider.as_ref(), symbol, &config, now).await
            }
        })
        .await;

        results
            .into_iter()
            .map(|(key, result)| (key.to_string(), result))
            .collect()
    }

    /// Sector ETF performance plus its top ten holdings
    pub async fn get_sector_data(&self, name: &str) -> Result<SectorData, AnalysisError> {
        let now = Utc::now();
        let sector_key = name.trim().to_lowercase().replace(' ', "_");
        let sector_symbol = self
            .catalog
            .sector_symbol(&sector_key)
            .ok_or_else(|| AnalysisError::InvalidInput(format!("Unknown sector: {}", name)))?;
        tracing::info!("Sector drill-down for {} ({})", sector_key, sector_symbol);

        let sector_data =
            markets::fetch_overview_entry(self.provider.as_ref(), sector_symbol, &self.config, now).await?;

        let holdings = match self.provider.get_top_holdings(sector_symbol).await {
            Ok(holdings) => holdings,
            Err(e) => {
                tracing::warn!("No holdings for {}: {}", sector_symbol, e);
                Vec::new()
            }
        };
        let holdings: Vec<_> = holdings.into_iter().take(SECTOR_TOP_HOLDINGS).collect();

        let by_symbol: HashMap<String, analysis_core::Holding> = holdings
            .iter()
            .map(|h| (h.symbol.clone(), h.clone()))
            .collect();
        let mut performance = fan_out(
            holdings.iter().map(|h| h.symbol.clone()),
            self.config.pool_width,
            |symbol: String| {
                let provider = Arc::clone(&self.provider);
                let config = Arc::clone(&self.config);
                let holding = by_symbol.get(&symbol).cloned();
                async move {
                    let holding = holding.ok_or_else(|| {
                        AnalysisError::Unknown(format!("Holding {} vanished", symbol))
                    })?;
                    Ok(markets::fetch_holding_performance(provider.as_ref(), holding, &config, now).await)
                }
            },
        )
        .await;

        let holdings = holdings
            .into_iter()
            .map(|h| match performance.remove(&h.symbol) {
                Some(Ok(row)) => row,
                _ => SectorHolding {
                    symbol: h.symbol,
                    name: h.name,
                    weight: h.weight,
                    change_percent: None,
                    momentum_1m: None,
                    momentum_1y: None,
                },
            })
            .collect();

        Ok(SectorData {
            sector_name: self
                .catalog
                .sector_display_name(sector_symbol)
                .map(str::to_string)
                .unwrap_or_else(|| sector_key.clone()),
            sector_key,
            sector_symbol: sector_symbol.to_string(),
            sector_data,
            holdings,
        })
    }

    pub async fn get_ticker_screen_data(&self, symbol: &str) -> Result<TickerScreen, AnalysisError> {
        let symbol = normalize_ticker_symbol(symbol);
        tracing::info!("Ticker screen for {}", symbol);
        markets::screen_ticker(&self.provider, &symbol, &self.config, Utc::now()).await
    }

    /// Screens for several tickers in request order. Each entry carries the
    /// normalized symbol and either its record or the error it hit.
    pub async fn get_ticker_screen_batch(
        &self,
        symbols: &[String],
    ) -> Vec<(String, Result<TickerScreen, AnalysisError>)> {
        let now = Utc::now();
        let normalized: Vec<String> = symbols.iter().map(|s| normalize_ticker_symbol(s)).collect();
        tracing::info!("Ticker screen batch: {} symbols", normalized.len());

        let results = fan_out(normalized.iter().cloned(), self.config.pool_width, |symbol: String| {
            let provider = Arc::clone(&self.provider);
            let config = Arc::clone(&self.config);
            async move { markets::screen_ticker(&provider, &symbol, &config, now).await }
        })
        .await;

        normalized
            .into_iter()
            .map(|symbol| {
                let result = match results.get(&symbol) {
                    Some(Ok(screen)) => Ok(screen.clone()),
                    Some(Err(e)) => Err(e.clone()),
                    None => Err(AnalysisError::Unknown(format!("No result for {}", symbol))),
                };
                (symbol, result)
            })
            .collect()
    }

    pub fn market_status(&self, region: &str, now: DateTime<Utc>) -> &'static str {
        market_hours::market_status(region, now)
    }
}
