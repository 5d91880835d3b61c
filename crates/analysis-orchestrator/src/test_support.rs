use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use analysis_core::{
    AnalysisError, Holding, Interval, OptionsChainSnapshot, PricePoint, PriceSeries, Quote,
    QuoteProvider,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};

use crate::history::{ny_date, ny_midnight};

/// In-memory provider for service tests
#[derive(Default)]
pub struct MockProvider {
    quotes: HashMap<String, Quote>,
    histories: HashMap<String, Vec<PricePoint>>,
    chains: HashMap<String, Vec<OptionsChainSnapshot>>,
    broken_chains: HashSet<(String, NaiveDate)>,
    holdings: HashMap<String, Vec<Holding>>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    quote_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, symbol: &str, last: f64, previous_close: f64) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                name: Some(format!("{} Inc.", symbol)),
                last_price: Some(last),
                previous_close: Some(previous_close),
                change_percent: None,
                timestamp: Utc::now(),
            },
        );
        self
    }

    pub fn with_provider_change(mut self, symbol: &str, change_percent: f64) -> Self {
        if let Some(quote) = self.quotes.get_mut(symbol) {
            quote.change_percent = Some(change_percent);
        }
        self
    }

    /// One close per calendar day, the last one yesterday (New York)
    pub fn with_daily_closes(mut self, symbol: &str, closes: &[f64]) -> Self {
        let today = ny_date(Utc::now());
        let n = closes.len() as i64;
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                timestamp: ny_midnight(today - Duration::days(n - i as i64)),
                close,
            })
            .collect();
        self.histories.insert(symbol.to_string(), points);
        self
    }

    pub fn with_closes_on(mut self, symbol: &str, closes: &[(NaiveDate, f64)]) -> Self {
        let points = closes
            .iter()
            .map(|&(date, close)| PricePoint {
                timestamp: ny_midnight(date),
                close,
            })
            .collect();
        self.histories.insert(symbol.to_string(), points);
        self
    }

    pub fn with_chain(mut self, chain: OptionsChainSnapshot) -> Self {
        let chains = self.chains.entry(chain.symbol.clone()).or_default();
        chains.push(chain);
        chains.sort_by_key(|c| c.expiration_date);
        self
    }

    /// Listed expiration whose chain request fails
    pub fn with_broken_chain(mut self, symbol: &str, expiration: NaiveDate) -> Self {
        self.broken_chains.insert((symbol.to_string(), expiration));
        self
    }

    pub fn with_holdings(mut self, etf: &str, holdings: Vec<Holding>) -> Self {
        self.holdings.insert(etf.to_string(), holdings);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn panicking(mut self, symbol: &str) -> Self {
        self.panicking.insert(symbol.to_string());
        self
    }

    /// Number of `get_quote` requests served so far
    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    fn check(&self, symbol: &str) -> Result<(), AnalysisError> {
        if self.panicking.contains(symbol) {
            panic!("provider blew up on {}", symbol);
        }
        if self.failing.contains(symbol) {
            return Err(AnalysisError::ProviderError(format!("HTTP 500: {}", symbol)));
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteProvider for MockProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, AnalysisError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.check(symbol)?;
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| AnalysisError::ProviderError(format!("No quote for {}", symbol)))
    }

    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _interval: Interval,
    ) -> Result<PriceSeries, AnalysisError> {
        self.check(symbol)?;
        let points = self
            .histories
            .get(symbol)
            .ok_or_else(|| AnalysisError::ProviderError(format!("No data for {}", symbol)))?;
        let (from, to) = (ny_midnight(start), ny_midnight(end));
        let window = points
            .iter()
            .filter(|p| p.timestamp >= from && p.timestamp < to)
            .copied()
            .collect();
        Ok(PriceSeries::new(symbol, window))
    }

    async fn get_options_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, AnalysisError> {
        self.check(symbol)?;
        let mut dates: Vec<NaiveDate> = self
            .chains
            .get(symbol)
            .map(|chains| chains.iter().map(|c| c.expiration_date).collect())
            .unwrap_or_default();
        dates.extend(
            self.broken_chains
                .iter()
                .filter(|(s, _)| s == symbol)
                .map(|(_, d)| *d),
        );
        dates.sort();
        Ok(dates)
    }

    async fn get_options_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionsChainSnapshot, AnalysisError> {
        self.check(symbol)?;
        if self.broken_chains.contains(&(symbol.to_string(), expiration)) {
            return Err(AnalysisError::ProviderError("HTTP 404: chain".to_string()));
        }
        self.chains
            .get(symbol)
            .and_then(|chains| chains.iter().find(|c| c.expiration_date == expiration))
            .cloned()
            .ok_or_else(|| AnalysisError::ProviderError(format!("No chain for {}", symbol)))
    }

    async fn get_top_holdings(&self, etf_symbol: &str) -> Result<Vec<Holding>, AnalysisError> {
        self.check(etf_symbol)?;
        self.holdings
            .get(etf_symbol)
            .cloned()
            .ok_or_else(|| AnalysisError::ProviderError(format!("No holdings for {}", etf_symbol)))
    }
}
