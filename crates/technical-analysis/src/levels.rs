use analysis_core::{PriceLevels, PriceSeries};
use chrono::{DateTime, Duration, Utc};

use crate::indicators::sma;

pub const SHORT_AVERAGE_DAYS: usize = 50;
pub const LONG_AVERAGE_DAYS: usize = 200;

/// 50/200-bar averages of the latest closes and the 52-week close range
/// ending at `as_of`. Each level is absent when the series is too short.
pub fn price_levels(series: &PriceSeries, as_of: DateTime<Utc>) -> PriceLevels {
    let closes = series.closes();
    let since = as_of - Duration::weeks(52);
    let year: Vec<f64> = series
        .points
        .iter()
        .filter(|p| p.timestamp >= since && p.timestamp <= as_of)
        .map(|p| p.close)
        .collect();

    PriceLevels {
        fifty_day_avg: sma(&closes, SHORT_AVERAGE_DAYS).last().copied(),
        two_hundred_day_avg: sma(&closes, LONG_AVERAGE_DAYS).last().copied(),
        fifty_two_week_high: year.iter().copied().reduce(f64::max),
        fifty_two_week_low: year.iter().copied().reduce(f64::min),
    }
}
