use std::sync::Arc;

use analysis_core::{
    AnalysisError, ExpirationSelector, Holding, Interval, Quote, QuoteProvider, SymbolCatalog,
};
use chrono::{DateTime, Utc};
use technical_analysis::{price_levels, rsi};

use crate::history::{fetch_price_history, fetch_ticker_and_market};
use crate::metrics::momentum_from_price;
use crate::options::options_analytics;
use crate::records::{MarketOverviewEntry, SectorHolding, TickerScreen, TickerSnapshot};
use crate::EngineConfig;

/// Expand category names (or bare market keys) into market keys.
/// Unknown names are dropped; order is kept and duplicates removed.
pub fn resolve_snapshot_keys(catalog: &SymbolCatalog, categories: &[String]) -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = Vec::new();
    for name in categories {
        let name = name.to_lowercase();
        let expanded: Vec<&'static str> = if let Some(group) = catalog.category(&name) {
            group.to_vec()
        } else if let Some(key) = catalog.market_key(&name) {
            vec![key]
        } else {
            tracing::debug!("Ignoring unknown category {}", name);
            continue;
        };

        for key in expanded {
            if catalog.is_market_key(key) && !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    keys
}

fn is_futures(symbol: &str) -> bool {
    symbol.ends_with("=F")
}

/// Futures settle against the prior session's settlement, not the previous
/// close, so the provider's own figure is preferred for them.
fn overview_change(symbol: &str, quote: &Quote) -> Option<f64> {
    if is_futures(symbol) {
        quote
            .change_percent
            .or_else(|| quote.change_from_previous_close())
    } else {
        quote.change_from_previous_close()
    }
}

pub async fn fetch_ticker_snapshot(
    provider: &dyn QuoteProvider,
    symbol: &str,
    include_momentum: bool,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<TickerSnapshot, AnalysisError> {
    let quote = provider.get_quote(symbol).await?;

    let momentum = match (include_momentum, quote.last_price) {
        (true, Some(price)) => {
            Some(momentum_from_price(provider, symbol, price, now, config.price_window_days).await)
        }
        (true, None) => Some(Default::default()),
        (false, _) => None,
    };

    Ok(TickerSnapshot {
        symbol: symbol.to_string(),
        name: quote.name.clone(),
        price: quote.last_price,
        change_percent: quote
            .change_percent
            .or_else(|| quote.change_from_previous_close()),
        momentum,
    })
}

pub async fn fetch_overview_entry(
    provider: &dyn QuoteProvider,
    symbol: &str,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<MarketOverviewEntry, AnalysisError> {
    let quote = provider.get_quote(symbol).await?;
    let momentum = match quote.last_price {
        Some(price) => momentum_from_price(provider, symbol, price, now, config.price_window_days).await,
        None => Default::default(),
    };

    Ok(MarketOverviewEntry {
        symbol: symbol.to_string(),
        price: quote.last_price,
        change_percent: overview_change(symbol, &quote),
        momentum_1m: momentum.momentum_1m,
        momentum_1y: momentum.momentum_1y,
    })
}

/// Holding row with its performance. A failed lookup leaves the figures empty.
pub async fn fetch_holding_performance(
    provider: &dyn QuoteProvider,
    holding: Holding,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> SectorHolding {
    let quote = match provider.get_quote(&holding.symbol).await {
        Ok(quote) => Some(quote),
        Err(e) => {
            tracing::debug!("Holding quote for {} failed: {}", holding.symbol, e);
            None
        }
    };
    let change_percent = quote.as_ref().and_then(Quote::change_from_previous_close);
    let momentum = match quote.and_then(|q| q.last_price) {
        Some(price) => {
            momentum_from_price(provider, &holding.symbol, price, now, config.price_window_days).await
        }
        None => Default::default(),
    };

    SectorHolding {
        symbol: holding.symbol,
        name: holding.name,
        weight: holding.weight,
        change_percent,
        momentum_1m: momentum.momentum_1m,
        momentum_1y: momentum.momentum_1y,
    }
}

/// Quote, momentum, factor exposure, RSI, trend levels and nearest-expiration
/// options for one (already normalized) symbol
pub async fn screen_ticker(
    provider: &Arc<dyn QuoteProvider>,
    symbol: &str,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<TickerScreen, AnalysisError> {
    let quote = provider.get_quote(symbol).await?;

    let momentum = async {
        match quote.last_price {
            Some(price) => {
                momentum_from_price(provider.as_ref(), symbol, price, now, config.price_window_days).await
            }
            None => Default::default(),
        }
    };
    let year = fetch_ticker_and_market(
        provider.as_ref(),
        symbol,
        config.factor_months,
        &config.market_symbol,
    );
    let recent = fetch_price_history(provider.as_ref(), symbol, config.screen_history_months, Interval::Day1);
    let options = async {
        match options_analytics(provider, symbol, ExpirationSelector::Nearest, config, now).await {
            Ok(analytics) => Some(analytics),
            Err(e) => {
                tracing::debug!("No options analytics for {}: {}", symbol, e);
                None
            }
        }
    };
    let (momentum, (ticker, market), recent, options) = tokio::join!(momentum, year, recent, options);

    Ok(TickerScreen {
        symbol: symbol.to_string(),
        name: quote.name.clone(),
        price: quote.last_price,
        change_percent: quote
            .change_percent
            .or_else(|| quote.change_from_previous_close()),
        momentum,
        factors: quant_analysis::decompose(&ticker, &market),
        rsi: rsi(&recent.closes(), config.rsi_period),
        levels: price_levels(&ticker, now),
        options,
        timestamp: now,
    })
}
