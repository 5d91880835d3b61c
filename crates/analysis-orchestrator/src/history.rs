use std::collections::HashMap;
use std::sync::Arc;

use analysis_core::{Interval, PriceSeries, QuoteProvider};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use technical_analysis::nearest_close;

use crate::pool::fan_out;

/// Default market proxy for factor regressions
pub const DEFAULT_MARKET_SYMBOL: &str = "^GSPC";

/// Average calendar days per month used to size history windows
const DAYS_PER_MONTH: f64 = 30.5;

/// Calendar date in New York
pub fn ny_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&New_York).date_naive()
}

/// New York midnight at the start of `date`, as a UTC instant
pub fn ny_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    New_York
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// `[start, end)` window covering `months` of history ending today (New York).
pub fn date_range(months: u32, now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
    let end = ny_date(now);
    let calendar_days = (months as f64 * DAYS_PER_MONTH).floor() as i64;
    (end - Duration::days(calendar_days), end)
}

/// Full history window for one symbol. Provider failures yield an empty series.
pub async fn fetch_price_history(
    provider: &dyn QuoteProvider,
    symbol: &str,
    months: u32,
    interval: Interval,
) -> PriceSeries {
    let (start, end) = date_range(months, Utc::now());
    match provider.get_history(symbol, start, end, interval).await {
        Ok(series) => series,
        Err(e) => {
            tracing::warn!("History fetch failed for {}: {}", symbol, e);
            PriceSeries::empty(symbol)
        }
    }
}

/// Histories for several symbols, fetched concurrently. Every requested
/// symbol maps to a series (empty when its fetch failed).
pub async fn fetch_multiple_histories(
    provider: Arc<dyn QuoteProvider>,
    symbols: &[String],
    months: u32,
    interval: Interval,
    width: usize,
) -> HashMap<String, PriceSeries> {
    let results = fan_out(symbols.iter().cloned(), width, |symbol: String| {
        let provider = Arc::clone(&provider);
        async move { Ok(fetch_price_history(provider.as_ref(), &symbol, months, interval).await) }
    })
    .await;

    results
        .into_iter()
        .map(|(symbol, result)| {
            let series = result.unwrap_or_else(|_| PriceSeries::empty(symbol.clone()));
            (symbol, series)
        })
        .collect()
}

/// Daily histories for a ticker and its market proxy, fetched in parallel.
pub async fn fetch_ticker_and_market(
    provider: &dyn QuoteProvider,
    symbol: &str,
    months: u32,
    market_symbol: &str,
) -> (PriceSeries, PriceSeries) {
    tokio::join!(
        fetch_price_history(provider, symbol, months, Interval::Day1),
        fetch_price_history(provider, market_symbol, months, Interval::Day1),
    )
}

/// Close nearest to New York midnight of `target`, looking `window_days`
/// either side of it.
pub async fn fetch_price_at_date(
    provider: &dyn QuoteProvider,
    symbol: &str,
    target: NaiveDate,
    window_days: i64,
) -> Option<f64> {
    let start = target - Duration::days(window_days);
    let end = target + Duration::days(window_days);

    match provider.get_history(symbol, start, end, Interval::Day1).await {
        Ok(series) => nearest_close(&series, ny_midnight(target)),
        Err(e) => {
            tracing::debug!("Price lookup for {} at {} failed: {}", symbol, target, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockProvider;

    #[test]
    fn test_date_range_uses_thirty_and_a_half_days() {
        // 15:00 UTC is still the same calendar day in New York
        let now = Utc.with_ymd_and_hms(2024, 6, 18, 15, 0, 0).unwrap();
        let (start, end) = date_range(12, now);
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 18).unwrap());
        assert_eq!((end - start).num_days(), 366);

        let (start, end) = date_range(1, now);
        assert_eq!((end - start).num_days(), 30);
        let (start, end) = date_range(3, now);
        assert_eq!((end - start).num_days(), 91);
    }

    #[test]
    fn test_date_range_ends_on_new_york_date() {
        // 02:00 UTC on the 19th is the evening of the 18th in New York
        let now = Utc.with_ymd_and_hms(2024, 6, 19, 2, 0, 0).unwrap();
        let (_, end) = date_range(1, now);
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 18).unwrap());
    }

    #[test]
    fn test_ny_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(ny_midnight(date), Utc.with_ymd_and_hms(2024, 1, 15, 5, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_failed_history_is_empty() {
        let provider = MockProvider::new().failing("BAD");
        let series = fetch_price_history(&provider, "BAD", 12, Interval::Day1).await;
        assert!(series.is_empty());
        assert_eq!(series.symbol, "BAD");
    }

    #[tokio::test]
    async fn test_multiple_histories_cover_every_symbol() {
        let provider: Arc<dyn QuoteProvider> = Arc::new(
            MockProvider::new()
                .with_daily_closes("AAPL", &[100.0, 101.0, 102.0])
                .failing("BAD"),
        );
        let symbols = vec!["AAPL".to_string(), "BAD".to_string(), "MISSING".to_string()];
        let histories = fetch_multiple_histories(provider, &symbols, 1, Interval::Day1, 2).await;

        assert_eq!(histories.len(), 3);
        assert_eq!(histories["AAPL"].len(), 3);
        assert!(histories["BAD"].is_empty());
        assert!(histories["MISSING"].is_empty());
    }

    #[tokio::test]
    async fn test_price_at_date_picks_nearest() {
        let target = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let provider = MockProvider::new().with_closes_on(
            "AAPL",
            &[
                (NaiveDate::from_ymd_opt(2024, 5, 8).unwrap(), 95.0),
                (NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(), 96.0),
                (NaiveDate::from_ymd_opt(2024, 5, 13).unwrap(), 99.0),
            ],
        );

        let price = fetch_price_at_date(&provider, "AAPL", target, 5).await;
        assert_eq!(price, Some(96.0));
    }

    #[tokio::test]
    async fn test_price_at_date_outside_window_is_none() {
        let provider = MockProvider::new().with_closes_on(
            "AAPL",
            &[(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 95.0)],
        );
        let target = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert_eq!(fetch_price_at_date(&provider, "AAPL", target, 5).await, None);
    }
}
