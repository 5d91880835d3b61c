use std::collections::HashMap;
use std::sync::Arc;

use analysis_core::{AnalysisError, ExpirationSelector, Interval, OptionsChainSnapshot, QuoteProvider};
use chrono::{DateTime, NaiveDate, Utc};
use options_analytics::OptionsAnalytics;

use crate::history::fetch_price_history;
use crate::pool::fan_out;
use crate::EngineConfig;

/// Options analytics for the selected expiration plus term structure,
/// per-expiration summary and historical IV context. `symbol` is expected
/// to be normalized already.
pub async fn options_analytics(
    provider: &Arc<dyn QuoteProvider>,
    symbol: &str,
    selector: ExpirationSelector,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<OptionsAnalytics, AnalysisError> {
    let expirations = provider.get_options_expirations(symbol).await?;
    let expiration = options_analytics::select_expiration(symbol, &expirations, selector)?;

    let chains = fetch_chains(provider, symbol, &expirations, config.pool_width).await;
    let mut analytics = match chains.get(&expiration) {
        Some(chain) => options_analytics::analyze_chain(chain, now)?,
        None => {
            let chain = provider.get_options_chain(symbol, expiration).await?;
            options_analytics::analyze_chain(&chain, now)?
        }
    };

    analytics.term_structure = expirations
        .iter()
        .take(options_analytics::TERM_STRUCTURE_EXPIRATIONS)
        .filter_map(|date| chains.get(date))
        .filter_map(|c| options_analytics::term_structure_point(c, now))
        .collect();
    analytics.contango = options_analytics::contango(&analytics.term_structure);

    analytics.all_expirations = expirations
        .iter()
        .filter_map(|date| chains.get(date))
        .filter_map(|c| options_analytics::expiration_summary(c, now))
        .collect();

    let (recent, year) = tokio::join!(
        fetch_price_history(provider.as_ref(), symbol, config.hist_vol_months, Interval::Day1),
        fetch_price_history(provider.as_ref(), symbol, config.iv_range_months, Interval::Day1),
    );
    analytics.historical_iv =
        options_analytics::historical_iv_context(&recent, &year, analytics.atm_call_iv);

    Ok(analytics)
}

/// One chain per listed expiration; failed expirations are left out.
async fn fetch_chains(
    provider: &Arc<dyn QuoteProvider>,
    symbol: &str,
    expirations: &[NaiveDate],
    width: usize,
) -> HashMap<NaiveDate, OptionsChainSnapshot> {
    let owned = symbol.to_string();
    let results = fan_out(expirations.iter().copied(), width, |date| {
        let provider = Arc::clone(provider);
        let symbol = owned.clone();
        async move { provider.get_options_chain(&symbol, date).await }
    })
    .await;

    results
        .into_iter()
        .filter_map(|(date, result)| match result {
            Ok(chain) => Some((date, chain)),
            Err(e) => {
                tracing::warn!("Skipping {} expiration {}: {}", symbol, date, e);
                None
            }
        })
        .collect()
}
