use analysis_core::{FactorResult, Horizon, MomentumResult, QuoteProvider};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use technical_analysis::percent_change;

use crate::history::{fetch_price_at_date, fetch_ticker_and_market, ny_date};

/// Trailing 1W/1M/1Y returns against the provider's latest price.
///
/// Only a narrow window around each anchor date is downloaded. Any failure
/// leaves the affected horizons absent.
pub async fn calculate_momentum(
    provider: &dyn QuoteProvider,
    symbol: &str,
    now: DateTime<Utc>,
    window_days: i64,
) -> MomentumResult {
    let current = match provider.get_quote(symbol).await {
        Ok(quote) => quote.last_price,
        Err(e) => {
            tracing::warn!("Quote for {} unavailable, skipping momentum: {}", symbol, e);
            None
        }
    };

    match current {
        Some(price) => momentum_from_price(provider, symbol, price, now, window_days).await,
        None => MomentumResult::default(),
    }
}

/// Momentum when the current price is already known
pub async fn momentum_from_price(
    provider: &dyn QuoteProvider,
    symbol: &str,
    current: f64,
    now: DateTime<Utc>,
    window_days: i64,
) -> MomentumResult {
    let today = ny_date(now);
    let anchors = join_all(Horizon::ALL.iter().map(|horizon| {
        let target = today - Duration::days(horizon.days());
        fetch_price_at_date(provider, symbol, target, window_days)
    }))
    .await;

    let mut result = MomentumResult::default();
    for (horizon, anchor) in Horizon::ALL.iter().zip(anchors) {
        if anchor.is_none() {
            tracing::debug!("{}: no {} anchor price", symbol, horizon.label());
        }
        result.set(*horizon, percent_change(current, anchor));
    }
    result
}

/// Factor decomposition of a ticker against the market proxy
pub async fn calculate_idio_vol(
    provider: &dyn QuoteProvider,
    symbol: &str,
    months: u32,
    market_symbol: &str,
) -> FactorResult {
    let (ticker, market) = fetch_ticker_and_market(provider, symbol, months, market_symbol).await;
    let result = quant_analysis::decompose(&ticker, &market);
    tracing::debug!(
        "{}: {} aligned observations, beta {:?}",
        symbol,
        result.observations,
        result.beta
    );
    result
}
