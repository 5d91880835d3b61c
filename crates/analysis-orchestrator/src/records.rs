use analysis_core::{FactorResult, MomentumResult, PriceLevels};
use chrono::{DateTime, Utc};
use options_analytics::OptionsAnalytics;
use serde::{Deserialize, Serialize};

/// Quote line on the market snapshot screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    /// Present only when momentum was requested
    pub momentum: Option<MomentumResult>,
}

/// One row of the markets overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverviewEntry {
    pub symbol: String,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub momentum_1m: Option<f64>,
    pub momentum_1y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorHolding {
    pub symbol: String,
    pub name: String,
    pub weight: f64,
    pub change_percent: Option<f64>,
    pub momentum_1m: Option<f64>,
    pub momentum_1y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorData {
    pub sector_key: String,
    pub sector_name: String,
    pub sector_symbol: String,
    pub sector_data: MarketOverviewEntry,
    /// Top holdings in fund order; empty when the provider has none
    pub holdings: Vec<SectorHolding>,
}

/// Everything the single-ticker screen shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerScreen {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub momentum: MomentumResult,
    pub factors: FactorResult,
    pub rsi: Option<f64>,
    pub levels: PriceLevels,
    /// Nearest expiration; absent when the symbol has no usable options
    pub options: Option<OptionsAnalytics>,
    pub timestamp: DateTime<Utc>,
}
