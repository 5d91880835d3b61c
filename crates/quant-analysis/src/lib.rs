use std::collections::BTreeMap;

use analysis_core::{FactorResult, PriceSeries};
use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use statrs::statistics::Statistics;

/// Trading days per year used to annualize daily volatility
pub const TRADING_DAYS: f64 = 252.0;

/// Minimum aligned daily returns for a factor regression
pub const MIN_OBSERVATIONS: usize = 30;

/// Simple returns between consecutive prices
pub fn calculate_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| r.is_finite())
        .collect()
}

/// Daily simple returns keyed by the UTC calendar date of the later close.
/// A date that repeats keeps its last return.
pub fn daily_returns(series: &PriceSeries) -> BTreeMap<NaiveDate, f64> {
    series
        .points
        .windows(2)
        .filter_map(|w| {
            let r = (w[1].close - w[0].close) / w[0].close;
            r.is_finite().then(|| (w[1].timestamp.date_naive(), r))
        })
        .collect()
}

/// Pair up ticker and market returns on the dates both have.
pub fn align_returns(
    ticker: &BTreeMap<NaiveDate, f64>,
    market: &BTreeMap<NaiveDate, f64>,
) -> (Vec<f64>, Vec<f64>) {
    ticker
        .iter()
        .filter_map(|(date, &r)| market.get(date).map(|&m| (r, m)))
        .unzip()
}

/// Annualized volatility in percent: sample std dev × √252 × 100
pub fn annualized_volatility(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let std_dev = returns.std_dev();
    std_dev
        .is_finite()
        .then(|| std_dev * TRADING_DAYS.sqrt() * 100.0)
}

/// Annualized volatility of a price series' daily returns
pub fn realized_volatility(series: &PriceSeries) -> Option<f64> {
    annualized_volatility(&calculate_returns(&series.closes()))
}

/// Annualized volatility over each trailing `window` of returns
pub fn rolling_volatility(returns: &[f64], window: usize) -> Vec<f64> {
    if window < 2 || returns.len() < window {
        return vec![];
    }
    returns
        .windows(window)
        .filter_map(annualized_volatility)
        .collect()
}

/// First-degree least squares fit `y = beta * x + alpha`.
///
/// Returns `(beta, alpha)`, or `None` when the system is degenerate.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len();
    let design = DMatrix::from_fn(n, 2, |row, col| if col == 0 { x[row] } else { 1.0 });
    let target = DVector::from_column_slice(y);

    let coefficients = design.svd(true, true).solve(&target, 1e-12).ok()?;
    let (beta, alpha) = (coefficients[0], coefficients[1]);
    (beta.is_finite() && alpha.is_finite()).then_some((beta, alpha))
}

/// Split a ticker's volatility into market (beta) and idiosyncratic parts.
///
/// Both series need at least [`MIN_OBSERVATIONS`] points and the aligned
/// return history must be at least as long; otherwise every field is absent.
pub fn decompose(ticker: &PriceSeries, market: &PriceSeries) -> FactorResult {
    if ticker.len() < MIN_OBSERVATIONS || market.len() < MIN_OBSERVATIONS {
        return FactorResult::default();
    }

    let (stock_returns, market_returns) =
        align_returns(&daily_returns(ticker), &daily_returns(market));
    let observations = stock_returns.len();
    if observations < MIN_OBSERVATIONS {
        return FactorResult {
            observations,
            ..FactorResult::default()
        };
    }

    let Some((beta, alpha)) = linear_regression(&market_returns, &stock_returns) else {
        return FactorResult {
            observations,
            ..FactorResult::default()
        };
    };

    let residuals: Vec<f64> = stock_returns
        .iter()
        .zip(&market_returns)
        .map(|(r, m)| r - (alpha + beta * m))
        .collect();

    FactorResult {
        idio_vol: annualized_volatility(&residuals),
        total_vol: annualized_volatility(&stock_returns),
        beta: Some(beta),
        alpha: Some(alpha),
        observations,
    }
}
