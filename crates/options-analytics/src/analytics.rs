use std::cmp::Ordering;

use analysis_core::{AnalysisError, ContractQuote, ExpirationSelector, OptionsChainSnapshot, PriceSeries};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use quant_analysis::{calculate_returns, realized_volatility, rolling_volatility};

use crate::models::*;

/// Expirations sampled for the term structure
pub const TERM_STRUCTURE_EXPIRATIONS: usize = 3;
/// Contracts kept per top-positions list
pub const TOP_POSITIONS: usize = 10;
/// Volume above this multiple of open interest is unusual
pub const UNUSUAL_VOLUME_MULTIPLE: f64 = 2.0;

const OTM_PUT_MONEYNESS: f64 = 0.9;
const OTM_CALL_MONEYNESS: f64 = 1.1;

const HIST_VOL_MIN_POINTS: usize = 30;
const IV_RANGE_POINTS: usize = 252;
const IV_RANGE_WINDOW: usize = 30;

/// Resolve which expiration to analyze from the provider's listing.
pub fn select_expiration(
    symbol: &str,
    expirations: &[NaiveDate],
    selector: ExpirationSelector,
) -> Result<NaiveDate, AnalysisError> {
    let first = expirations.first().copied().ok_or_else(|| {
        AnalysisError::InsufficientData(format!("No options available for {}", symbol))
    })?;

    match selector {
        ExpirationSelector::Nearest => Ok(first),
        ExpirationSelector::Date(date) if expirations.contains(&date) => Ok(date),
        ExpirationSelector::Date(date) => Err(AnalysisError::InvalidInput(format!(
            "Expiration {} not available for {}",
            date, symbol
        ))),
    }
}

/// Whole days until the expiration's New York midnight, rounded down.
pub fn days_to_expiry(expiration: NaiveDate, now: DateTime<Utc>) -> i64 {
    let Some(midnight) = expiration.and_hms_opt(0, 0, 0) else {
        return 0;
    };
    let expires_at = match New_York.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => midnight.and_utc(),
    };
    (expires_at - now).num_seconds().div_euclid(86_400)
}

fn sum_oi(contracts: &[ContractQuote]) -> u64 {
    contracts.iter().map(|c| c.open_interest).sum()
}

fn sum_volume(contracts: &[ContractQuote]) -> u64 {
    contracts.iter().map(|c| c.volume()).sum()
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn positioning(calls: &[ContractQuote], puts: &[ContractQuote]) -> Positioning {
    let call_oi_total = sum_oi(calls);
    let put_oi_total = sum_oi(puts);
    let call_volume_total = sum_volume(calls);
    let put_volume_total = sum_volume(puts);

    Positioning {
        call_oi_total,
        put_oi_total,
        pc_ratio_oi: ratio(put_oi_total, call_oi_total),
        call_volume_total,
        put_volume_total,
        pc_ratio_vol: ratio(put_volume_total, call_volume_total),
    }
}

/// Contract whose strike is closest to `price`; the first listed wins ties.
pub fn nearest_strike(contracts: &[ContractQuote], price: f64) -> Option<&ContractQuote> {
    contracts.iter().fold(None, |best: Option<&ContractQuote>, c| match best {
        Some(b) if (b.strike - price).abs() <= (c.strike - price).abs() => Some(b),
        _ => Some(c),
    })
}

/// ATM strike, taken from the call side
pub fn atm_strike(calls: &[ContractQuote], current_price: f64) -> Option<f64> {
    nearest_strike(calls, current_price).map(|c| c.strike)
}

/// ATM call and put IV in percent.
///
/// When no put is listed at the ATM strike the put nearest the current price
/// stands in.
pub fn atm_implied_vols(
    calls: &[ContractQuote],
    puts: &[ContractQuote],
    current_price: f64,
) -> Option<(f64, f64, f64)> {
    let atm_call = nearest_strike(calls, current_price)?;
    let atm_put = puts
        .iter()
        .find(|p| p.strike == atm_call.strike)
        .or_else(|| nearest_strike(puts, current_price))?;

    Some((
        atm_call.strike,
        atm_call.implied_volatility * 100.0,
        atm_put.implied_volatility * 100.0,
    ))
}

fn oi_of(side: &[&ContractQuote]) -> u64 {
    side.iter().map(|c| c.open_interest).sum()
}

pub fn moneyness_split(
    calls: &[ContractQuote],
    puts: &[ContractQuote],
    current_price: f64,
) -> MoneynessSplit {
    let (calls_itm, calls_otm): (Vec<&ContractQuote>, Vec<&ContractQuote>) =
        calls.iter().partition(|c| c.strike < current_price);
    let (puts_itm, puts_otm): (Vec<&ContractQuote>, Vec<&ContractQuote>) =
        puts.iter().partition(|p| p.strike > current_price);

    MoneynessSplit {
        call_itm_count: calls_itm.len(),
        call_otm_count: calls_otm.len(),
        put_itm_count: puts_itm.len(),
        put_otm_count: puts_otm.len(),
        call_oi_itm: oi_of(&calls_itm),
        call_oi_otm: oi_of(&calls_otm),
        put_oi_itm: oi_of(&puts_itm),
        put_oi_otm: oi_of(&puts_otm),
    }
}

fn mean_iv_pct<'a>(contracts: impl Iterator<Item = &'a ContractQuote>) -> Option<f64> {
    let (sum, count) = contracts.fold((0.0, 0usize), |(s, n), c| (s + c.implied_volatility, n + 1));
    (count > 0).then(|| sum / count as f64 * 100.0)
}

/// OTM wing IV against ATM IV. Wings with no qualifying strikes read as 0.
pub fn skew(
    calls: &[ContractQuote],
    puts: &[ContractQuote],
    current_price: f64,
    atm_call_iv: f64,
    atm_put_iv: f64,
) -> Skew {
    let otm_put_iv = mean_iv_pct(puts.iter().filter(|p| p.strike < current_price * OTM_PUT_MONEYNESS))
        .unwrap_or(atm_put_iv);
    let otm_call_iv = mean_iv_pct(calls.iter().filter(|c| c.strike > current_price * OTM_CALL_MONEYNESS))
        .unwrap_or(atm_call_iv);

    Skew {
        put_skew: otm_put_iv - atm_put_iv,
        call_skew: otm_call_iv - atm_call_iv,
    }
}

/// Strike at which option writers pay out the least at expiration.
///
/// Candidates are every listed strike in ascending order; the first minimum wins.
pub fn max_pain(calls: &[ContractQuote], puts: &[ContractQuote]) -> Option<f64> {
    let mut strikes: Vec<f64> = calls.iter().chain(puts).map(|c| c.strike).collect();
    strikes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    strikes.dedup();

    let mut best: Option<(f64, f64)> = None;
    for &candidate in &strikes {
        let call_pain: f64 = calls
            .iter()
            .filter(|c| c.strike < candidate)
            .map(|c| (candidate - c.strike) * c.open_interest as f64)
            .sum();
        let put_pain: f64 = puts
            .iter()
            .filter(|p| p.strike > candidate)
            .map(|p| (p.strike - candidate) * p.open_interest as f64)
            .sum();
        let pain = call_pain + put_pain;

        match best {
            Some((_, min_pain)) if pain >= min_pain => {}
            _ => best = Some((candidate, pain)),
        }
    }
    best.map(|(strike, _)| strike)
}

pub fn is_unusual(contract: &ContractQuote) -> bool {
    contract.volume() as f64 > contract.open_interest as f64 * UNUSUAL_VOLUME_MULTIPLE
}

fn by_volume_desc(contracts: impl Iterator<Item = ContractQuote>) -> Vec<ContractQuote> {
    let mut sorted: Vec<ContractQuote> = contracts.collect();
    sorted.sort_by(|a, b| b.volume().cmp(&a.volume()));
    sorted
}

pub fn unusual_activity(calls: &[ContractQuote], puts: &[ContractQuote]) -> UnusualActivity {
    let unusual_calls = by_volume_desc(calls.iter().filter(|c| is_unusual(c)).cloned());
    let unusual_puts = by_volume_desc(puts.iter().filter(|p| is_unusual(p)).cloned());

    UnusualActivity {
        unusual_activity: !unusual_calls.is_empty() || !unusual_puts.is_empty(),
        call_count: unusual_calls.len(),
        put_count: unusual_puts.len(),
        unusual_calls,
        unusual_puts,
    }
}

fn top_by<K: Ord>(contracts: &[ContractQuote], key: impl Fn(&ContractQuote) -> K) -> Vec<ContractQuote> {
    let mut sorted = contracts.to_vec();
    sorted.sort_by(|a, b| key(b).cmp(&key(a)));
    sorted.truncate(TOP_POSITIONS);
    sorted
}

pub fn top_positions(calls: &[ContractQuote], puts: &[ContractQuote]) -> TopPositions {
    TopPositions {
        calls_by_oi: top_by(calls, |c| c.open_interest),
        puts_by_oi: top_by(puts, |c| c.open_interest),
        calls_by_volume: top_by(calls, |c| c.volume()),
        puts_by_volume: top_by(puts, |c| c.volume()),
    }
}

/// ATM call IV for one expiration; `None` if the chain has no calls.
pub fn term_structure_point(snapshot: &OptionsChainSnapshot, now: DateTime<Utc>) -> Option<TermStructurePoint> {
    let atm_call = nearest_strike(&snapshot.calls, snapshot.current_price)?;
    Some(TermStructurePoint {
        expiration_date: snapshot.expiration_date,
        days_to_expiry: days_to_expiry(snapshot.expiration_date, now),
        atm_iv: atm_call.implied_volatility * 100.0,
    })
}

/// Near-term ATM IV minus far-term ATM IV
pub fn contango(points: &[TermStructurePoint]) -> f64 {
    match (points.first(), points.last()) {
        (Some(near), Some(far)) if points.len() >= 2 => near.atm_iv - far.atm_iv,
        _ => 0.0,
    }
}

pub fn expiration_summary(snapshot: &OptionsChainSnapshot, now: DateTime<Utc>) -> Option<ExpirationSummary> {
    let point = term_structure_point(snapshot, now)?;
    let call_oi = sum_oi(&snapshot.calls);
    let put_oi = sum_oi(&snapshot.puts);
    let call_volume = sum_volume(&snapshot.calls);
    let put_volume = sum_volume(&snapshot.puts);

    Some(ExpirationSummary {
        expiration_date: point.expiration_date,
        days_to_expiry: point.days_to_expiry,
        atm_iv: point.atm_iv,
        call_oi,
        put_oi,
        total_oi: call_oi + put_oi,
        call_volume,
        put_volume,
        total_volume: call_volume + put_volume,
    })
}

/// Rank the ATM call IV against a year of 30-day realized volatility.
///
/// `recent` (about three months) must have 30 closes and `year` at least 252;
/// the trailing 252 closes of `year` are used.
pub fn historical_iv_context(
    recent: &PriceSeries,
    year: &PriceSeries,
    atm_call_iv: f64,
) -> Option<HistoricalIvContext> {
    if recent.len() < HIST_VOL_MIN_POINTS || year.len() < IV_RANGE_POINTS {
        return None;
    }
    let hist_vol_30d = realized_volatility(recent)?;

    let closes = year.closes();
    let trailing = &closes[closes.len() - IV_RANGE_POINTS..];
    let rolling = rolling_volatility(&calculate_returns(trailing), IV_RANGE_WINDOW);
    let iv_high_52w = rolling.iter().copied().reduce(f64::max)?;
    let iv_low_52w = rolling.iter().copied().reduce(f64::min)?;

    let iv_rank = if iv_high_52w > iv_low_52w {
        (atm_call_iv - iv_low_52w) / (iv_high_52w - iv_low_52w) * 100.0
    } else {
        50.0
    };

    Some(HistoricalIvContext {
        hist_vol_30d,
        iv_high_52w,
        iv_low_52w,
        iv_rank,
    })
}

/// Single-expiration analytics. Term structure, the all-expirations summary
/// and the historical IV block are left empty for the caller to fill in.
pub fn analyze_chain(snapshot: &OptionsChainSnapshot, now: DateTime<Utc>) -> Result<OptionsAnalytics, AnalysisError> {
    let calls = &snapshot.calls;
    let puts = &snapshot.puts;
    if calls.is_empty() || puts.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "No options chain data for {} {}",
            snapshot.symbol, snapshot.expiration_date
        )));
    }

    let price = snapshot.current_price;
    let (atm_strike, atm_call_iv, atm_put_iv) = atm_implied_vols(calls, puts, price)
        .ok_or_else(|| AnalysisError::CalculationError("ATM strike not found".to_string()))?;
    let max_pain_strike = max_pain(calls, puts)
        .ok_or_else(|| AnalysisError::CalculationError("No strikes for max pain".to_string()))?;

    Ok(OptionsAnalytics {
        symbol: snapshot.symbol.clone(),
        expiration_date: snapshot.expiration_date,
        current_price: price,
        days_to_expiry: days_to_expiry(snapshot.expiration_date, now),
        atm_strike,
        atm_call_iv,
        atm_put_iv,
        iv_spread: atm_call_iv - atm_put_iv,
        positioning: positioning(calls, puts),
        moneyness: moneyness_split(calls, puts, price),
        skew: skew(calls, puts, price, atm_call_iv, atm_put_iv),
        max_pain_strike,
        unusual: unusual_activity(calls, puts),
        top_positions: top_positions(calls, puts),
        term_structure: Vec::new(),
        contango: 0.0,
        all_expirations: Vec::new(),
        historical_iv: None,
        timestamp: now,
    })
}
