use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{AnalysisError, Holding, Interval, OptionsChainSnapshot, PriceSeries, Quote};

/// Source of market observations.
///
/// Every call may fail; implementations surface failures as
/// `AnalysisError::ProviderError` and never panic on bad payloads.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Latest quote (the fast path: no history download).
    async fn get_quote(&self, symbol: &str) -> Result<Quote, AnalysisError>;

    /// Closes between `start` (inclusive) and `end` (exclusive).
    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<PriceSeries, AnalysisError>;

    /// Listed option expirations, nearest first.
    async fn get_options_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, AnalysisError>;

    async fn get_options_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionsChainSnapshot, AnalysisError>;

    /// Largest constituents of an ETF, in the provider's order.
    async fn get_top_holdings(&self, etf_symbol: &str) -> Result<Vec<Holding>, AnalysisError>;
}
