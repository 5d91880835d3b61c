use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Latest quote for a symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub last_price: Option<f64>,
    pub previous_close: Option<f64>,
    /// Provider-reported change; for futures this is measured against the settlement price
    #[serde(default)]
    pub change_percent: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Percent change of the last price against the previous close
    pub fn change_from_previous_close(&self) -> Option<f64> {
        match (self.last_price, self.previous_close) {
            (Some(last), Some(prev)) if prev != 0.0 => Some((last - prev) / prev * 100.0),
            _ => None,
        }
    }
}

/// One close observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Ordered close prices for one symbol over a window. Empty means "no data".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }
}

/// Bar interval for history requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1wk")]
    Week1,
    #[serde(rename = "1mo")]
    Month1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
        }
    }
}

/// Trailing-return lookback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Horizon {
    OneWeek,
    OneMonth,
    OneYear,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::OneWeek, Horizon::OneMonth, Horizon::OneYear];

    /// Calendar days looked back for the anchor price
    pub fn days(&self) -> i64 {
        match self {
            Horizon::OneWeek => 7,
            Horizon::OneMonth => 30,
            Horizon::OneYear => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::OneWeek => "1W",
            Horizon::OneMonth => "1M",
            Horizon::OneYear => "1Y",
        }
    }
}

/// Trailing returns in percent. `None` means the anchor price was not resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentumResult {
    pub momentum_1w: Option<f64>,
    pub momentum_1m: Option<f64>,
    pub momentum_1y: Option<f64>,
}

impl MomentumResult {
    pub fn get(&self, horizon: Horizon) -> Option<f64> {
        match horizon {
            Horizon::OneWeek => self.momentum_1w,
            Horizon::OneMonth => self.momentum_1m,
            Horizon::OneYear => self.momentum_1y,
        }
    }

    pub fn set(&mut self, horizon: Horizon, value: Option<f64>) {
        match horizon {
            Horizon::OneWeek => self.momentum_1w = value,
            Horizon::OneMonth => self.momentum_1m = value,
            Horizon::OneYear => self.momentum_1y = value,
        }
    }
}

/// Volatility split into market and stock-specific parts (annualized, percent)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorResult {
    pub idio_vol: Option<f64>,
    pub total_vol: Option<f64>,
    pub beta: Option<f64>,
    pub alpha: Option<f64>,
    /// Aligned daily returns used in the regression
    pub observations: usize,
}

/// Trend levels shown on the ticker screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub fifty_day_avg: Option<f64>,
    pub two_hundred_day_avg: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

/// One listed option contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractQuote {
    #[serde(default)]
    pub contract_symbol: Option<String>,
    pub strike: f64,
    pub open_interest: u64,
    #[serde(default)]
    pub volume: Option<u64>,
    pub last_price: f64,
    /// Fractional form as reported by the provider (0.25 = 25%)
    pub implied_volatility: f64,
}

impl ContractQuote {
    /// Traded volume; illiquid contracts with no report count as zero
    pub fn volume(&self) -> u64 {
        self.volume.unwrap_or(0)
    }
}

/// Option chain for one expiration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsChainSnapshot {
    pub symbol: String,
    pub expiration_date: NaiveDate,
    pub current_price: f64,
    pub calls: Vec<ContractQuote>,
    pub puts: Vec<ContractQuote>,
}

/// Which expiration to analyze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirationSelector {
    Nearest,
    Date(NaiveDate),
}

/// ETF constituent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    /// Fraction of fund assets (0.21 = 21%)
    pub weight: f64,
}
