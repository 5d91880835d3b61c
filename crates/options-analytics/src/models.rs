use analysis_core::ContractQuote;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Open interest and volume totals with put/call ratios
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Positioning {
    pub call_oi_total: u64,
    pub put_oi_total: u64,
    /// 0 when there is no call open interest
    pub pc_ratio_oi: f64,
    pub call_volume_total: u64,
    pub put_volume_total: u64,
    /// 0 when there is no call volume
    pub pc_ratio_vol: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoneynessSplit {
    pub call_itm_count: usize,
    pub call_otm_count: usize,
    pub put_itm_count: usize,
    pub put_otm_count: usize,
    pub call_oi_itm: u64,
    pub call_oi_otm: u64,
    pub put_oi_itm: u64,
    pub put_oi_otm: u64,
}

/// Wing IV minus ATM IV, in percentage points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Skew {
    pub put_skew: f64,
    pub call_skew: f64,
}

/// Contracts trading more than twice their open interest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnusualActivity {
    pub unusual_activity: bool,
    pub call_count: usize,
    pub put_count: usize,
    /// Highest volume first
    pub unusual_calls: Vec<ContractQuote>,
    pub unusual_puts: Vec<ContractQuote>,
}

/// Largest contracts by open interest and by volume (at most 10 each)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopPositions {
    pub calls_by_oi: Vec<ContractQuote>,
    pub puts_by_oi: Vec<ContractQuote>,
    pub calls_by_volume: Vec<ContractQuote>,
    pub puts_by_volume: Vec<ContractQuote>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermStructurePoint {
    pub expiration_date: NaiveDate,
    pub days_to_expiry: i64,
    /// ATM call IV in percent
    pub atm_iv: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpirationSummary {
    pub expiration_date: NaiveDate,
    pub days_to_expiry: i64,
    pub atm_iv: f64,
    pub call_oi: u64,
    pub put_oi: u64,
    pub total_oi: u64,
    pub call_volume: u64,
    pub put_volume: u64,
    pub total_volume: u64,
}

/// Realized-volatility range used to rank the current ATM IV
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalIvContext {
    pub hist_vol_30d: f64,
    pub iv_high_52w: f64,
    pub iv_low_52w: f64,
    /// Position of ATM call IV in the 52-week range, 0-100 (50 if the range is empty)
    pub iv_rank: f64,
}

/// Everything derived from one expiration's chain plus the cross-expiration views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsAnalytics {
    pub symbol: String,
    pub expiration_date: NaiveDate,
    pub current_price: f64,
    pub days_to_expiry: i64,
    pub atm_strike: f64,
    pub atm_call_iv: f64,
    pub atm_put_iv: f64,
    pub iv_spread: f64,
    pub positioning: Positioning,
    pub moneyness: MoneynessSplit,
    pub skew: Skew,
    pub max_pain_strike: f64,
    pub unusual: UnusualActivity,
    pub top_positions: TopPositions,
    pub term_structure: Vec<TermStructurePoint>,
    /// Near ATM IV minus far ATM IV; 0 with fewer than two points
    pub contango: f64,
    pub all_expirations: Vec<ExpirationSummary>,
    pub historical_iv: Option<HistoricalIvContext>,
    pub timestamp: DateTime<Utc>,
}
