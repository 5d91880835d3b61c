use analysis_core::{
    AnalysisError, ContractQuote, Holding, Interval, OptionsChainSnapshot, PricePoint,
    PriceSeries, Quote, QuoteProvider,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance quote provider (chart, options and quoteSummary endpoints).
///
/// Failures come back as `AnalysisError::ProviderError`; nothing is retried.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: Client,
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), Duration::from_secs(30))
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// GET a JSON document, mapping transport and HTTP failures to provider errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AnalysisError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AnalysisError::ProviderError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::ProviderError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AnalysisError::ProviderError(e.to_string()))
    }

    async fn get_chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<ChartResult, AnalysisError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response: ChartResponse = self.get_json(&url, query).await?;
        first_chart_result(symbol, response)
    }

    async fn get_option_chain_result(
        &self,
        symbol: &str,
        expiration: Option<NaiveDate>,
    ) -> Result<OptionChainResult, AnalysisError> {
        let url = format!("{}/v7/finance/options/{}", self.base_url, symbol);
        let mut query = Vec::new();
        if let Some(date) = expiration {
            query.push(("date", date_to_epoch(date).to_string()));
        }
        let response: OptionChainResponse = self.get_json(&url, &query).await?;
        response
            .option_chain
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| AnalysisError::ProviderError(format!("No options data for {}", symbol)))
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, AnalysisError> {
        let chart = self
            .get_chart(symbol, &[("range", "1d".to_string()), ("interval", "1d".to_string())])
            .await?;
        Ok(chart_to_quote(symbol, &chart.meta))
    }

    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<PriceSeries, AnalysisError> {
        tracing::debug!("Fetching {} history {}..{} ({})", symbol, start, end, interval.as_str());
        let chart = self
            .get_chart(
                symbol,
                &[
                    ("period1", date_to_epoch(start).to_string()),
                    ("period2", date_to_epoch(end).to_string()),
                    ("interval", interval.as_str().to_string()),
                ],
            )
            .await?;
        Ok(chart_to_series(symbol, chart))
    }

    async fn get_options_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, AnalysisError> {
        let result = self.get_option_chain_result(symbol, None).await?;
        Ok(result
            .expiration_dates
            .iter()
            .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
            .collect())
    }

    async fn get_options_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionsChainSnapshot, AnalysisError> {
        let result = self.get_option_chain_result(symbol, Some(expiration)).await?;
        option_result_to_snapshot(symbol, expiration, result)
    }

    async fn get_top_holdings(&self, etf_symbol: &str) -> Result<Vec<Holding>, AnalysisError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, etf_symbol);
        let response: QuoteSummaryResponse = self
            .get_json(&url, &[("modules", "topHoldings".to_string())])
            .await?;
        Ok(summary_to_holdings(response))
    }
}

fn date_to_epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn first_chart_result(symbol: &str, response: ChartResponse) -> Result<ChartResult, AnalysisError> {
    if let Some(err) = response.chart.error {
        return Err(AnalysisError::ProviderError(format!(
            "{}: {}",
            err.code.unwrap_or_default(),
            err.description.unwrap_or_default()
        )));
    }
    response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AnalysisError::ProviderError(format!("No chart data for {}", symbol)))
}

fn chart_to_quote(symbol: &str, meta: &ChartMeta) -> Quote {
    Quote {
        symbol: meta.symbol.clone().unwrap_or_else(|| symbol.to_string()),
        name: meta.long_name.clone().or_else(|| meta.short_name.clone()),
        last_price: meta.regular_market_price,
        previous_close: meta.previous_close.or(meta.chart_previous_close),
        change_percent: meta.regular_market_change_percent,
        timestamp: meta
            .regular_market_time
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now),
    }
}

/// Pair timestamps with closes, dropping bars the provider left null.
fn chart_to_series(symbol: &str, chart: ChartResult) -> PriceSeries {
    let closes = chart
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let points = chart
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = close?;
            let timestamp = DateTime::from_timestamp(ts, 0)?;
            Some(PricePoint { timestamp, close })
        })
        .collect();

    PriceSeries::new(symbol, points)
}

fn option_result_to_snapshot(
    symbol: &str,
    expiration: NaiveDate,
    result: OptionChainResult,
) -> Result<OptionsChainSnapshot, AnalysisError> {
    let current_price = result
        .quote
        .as_ref()
        .and_then(|q| q.regular_market_price)
        .unwrap_or(0.0);

    let chain = result.options.into_iter().next().ok_or_else(|| {
        AnalysisError::ProviderError(format!("No option chain for {} {}", symbol, expiration))
    })?;

    Ok(OptionsChainSnapshot {
        symbol: symbol.to_string(),
        expiration_date: expiration,
        current_price,
        calls: chain.calls.into_iter().map(ContractQuote::from).collect(),
        puts: chain.puts.into_iter().map(ContractQuote::from).collect(),
    })
}

fn summary_to_holdings(response: QuoteSummaryResponse) -> Vec<Holding> {
    response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|r| r.top_holdings)
        .map(|t| {
            t.holdings
                .into_iter()
                .map(|h| Holding {
                    name: h.holding_name.unwrap_or_else(|| h.symbol.clone()),
                    weight: h.holding_percent.and_then(|p| p.raw).unwrap_or(0.0),
                    symbol: h.symbol,
                })
                .collect()
        })
        .unwrap_or_default()
}

// Chart response structures
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
    regular_market_change_percent: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// Options response structures
#[derive(Debug, Deserialize)]
struct OptionChainResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionChainEnvelope,
}

#[derive(Debug, Deserialize)]
struct OptionChainEnvelope {
    result: Option<Vec<OptionChainResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionChainResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    quote: Option<OptionUnderlyingQuote>,
    #[serde(default)]
    options: Vec<OptionChainBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionUnderlyingQuote {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OptionChainBody {
    #[serde(default)]
    calls: Vec<OptionContract>,
    #[serde(default)]
    puts: Vec<OptionContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionContract {
    contract_symbol: Option<String>,
    strike: f64,
    last_price: Option<f64>,
    volume: Option<u64>,
    open_interest: Option<u64>,
    implied_volatility: Option<f64>,
}

impl From<OptionContract> for ContractQuote {
    fn from(c: OptionContract) -> Self {
        ContractQuote {
            contract_symbol: c.contract_symbol,
            strike: c.strike,
            open_interest: c.open_interest.unwrap_or(0),
            volume: c.volume,
            last_price: c.last_price.unwrap_or(0.0),
            implied_volatility: c.implied_volatility.unwrap_or(0.0),
        }
    }
}

// quoteSummary response structures
#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    top_holdings: Option<TopHoldings>,
}

#[derive(Debug, Deserialize)]
struct TopHoldings {
    #[serde(default)]
    holdings: Vec<TopHolding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopHolding {
    symbol: String,
    holding_name: Option<String>,
    holding_percent: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_JSON: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "AAPL",
                    "longName": "Apple Inc.",
                    "regularMarketPrice": 189.5,
                    "regularMarketTime": 1704317400,
                    "previousClose": 185.0,
                    "chartPreviousClose": 180.0
                },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {"quote": [{"close": [185.64, null, 181.91]}]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_chart_to_series_drops_null_closes() {
        let response: ChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        let chart = first_chart_result("AAPL", response).unwrap();
        let series = chart_to_series("AAPL", chart);

        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![185.64, 181.91]);
        assert_eq!(series.points[0].timestamp.timestamp(), 1704205800);
    }

    #[test]
    fn test_chart_to_quote_prefers_previous_close() {
        let response: ChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        let chart = first_chart_result("AAPL", response).unwrap();
        let quote = chart_to_quote("AAPL", &chart.meta);

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.name.as_deref(), Some("Apple Inc."));
        assert_eq!(quote.last_price, Some(189.5));
        assert_eq!(quote.previous_close, Some(185.0));
        assert_eq!(quote.change_percent, None);
        assert_eq!(quote.timestamp.timestamp(), 1704317400);
    }

    #[test]
    fn test_chart_error_is_provider_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        let err = first_chart_result("ZZZZ", response).unwrap_err();
        assert!(matches!(err, AnalysisError::ProviderError(msg) if msg.contains("delisted")));
    }

    #[test]
    fn test_option_chain_to_snapshot() {
        let body = r#"{
            "optionChain": {
                "result": [{
                    "underlyingSymbol": "AAPL",
                    "expirationDates": [1705622400, 1706227200],
                    "quote": {"regularMarketPrice": 190.0},
                    "options": [{
                        "expirationDate": 1705622400,
                        "calls": [{"contractSymbol": "AAPL240119C00190000", "strike": 190.0, "lastPrice": 3.1, "volume": 1200, "openInterest": 5000, "impliedVolatility": 0.22}],
                        "puts": [{"contractSymbol": "AAPL240119P00190000", "strike": 190.0, "lastPrice": 2.9, "openInterest": 4000, "impliedVolatility": 0.24}]
                    }]
                }],
                "error": null
            }
        }"#;
        let response: OptionChainResponse = serde_json::from_str(body).unwrap();
        let result = response.option_chain.result.unwrap().into_iter().next().unwrap();
        assert_eq!(result.expiration_dates.len(), 2);

        let expiration = NaiveDate::from_ymd_opt(2024, 1, 19).unwrap();
        let snapshot = option_result_to_snapshot("AAPL", expiration, result).unwrap();

        assert_eq!(snapshot.current_price, 190.0);
        assert_eq!(snapshot.calls[0].open_interest, 5000);
        assert_eq!(snapshot.calls[0].volume(), 1200);
        assert_eq!(snapshot.puts[0].volume, None);
        assert_eq!(snapshot.puts[0].volume(), 0);
    }

    #[test]
    fn test_summary_to_holdings() {
        let body = r#"{
            "quoteSummary": {
                "result": [{"topHoldings": {"holdings": [
                    {"symbol": "MSFT", "holdingName": "Microsoft Corp", "holdingPercent": {"raw": 0.22, "fmt": "22.00%"}},
                    {"symbol": "AAPL", "holdingPercent": {"raw": 0.21}}
                ]}}],
                "error": null
            }
        }"#;
        let response: QuoteSummaryResponse = serde_json::from_str(body).unwrap();
        let holdings = summary_to_holdings(response);

        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].name, "Microsoft Corp");
        assert_eq!(holdings[1].name, "AAPL");
        assert!((holdings[1].weight - 0.21).abs() < 1e-12);
    }

    #[test]
    fn test_date_to_epoch_is_utc_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 19).unwrap();
        assert_eq!(date_to_epoch(date), 1705622400);
    }
}
