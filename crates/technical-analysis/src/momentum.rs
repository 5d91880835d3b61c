use analysis_core::{Horizon, MomentumResult, PriceSeries};
use chrono::{DateTime, Duration, Utc};

/// Default half-width of the window searched around an anchor date
pub const DEFAULT_WINDOW_DAYS: i64 = 5;

/// Percent change from `anchor` to `current`. Absent when the anchor is
/// unknown or zero.
pub fn percent_change(current: f64, anchor: Option<f64>) -> Option<f64> {
    match anchor {
        Some(a) if a != 0.0 => Some((current - a) / a * 100.0),
        _ => None,
    }
}

/// Close nearest in time to `target`. Ties go to the earlier point.
pub fn nearest_close(series: &PriceSeries, target: DateTime<Utc>) -> Option<f64> {
    let mut best: Option<(i64, f64)> = None;
    for point in &series.points {
        let delta = (point.timestamp - target).num_seconds().abs();
        match best {
            Some((best_delta, _)) if delta >= best_delta => {}
            _ => best = Some((delta, point.close)),
        }
    }
    best.map(|(_, close)| close)
}

/// Like [`nearest_close`] but only considers points within `window_days` of the target.
pub fn nearest_close_within(
    series: &PriceSeries,
    target: DateTime<Utc>,
    window_days: i64,
) -> Option<f64> {
    let window = Duration::days(window_days);
    let points = series
        .points
        .iter()
        .filter(|p| (p.timestamp - target).abs() <= window)
        .copied()
        .collect();
    nearest_close(&PriceSeries::new(series.symbol.clone(), points), target)
}

/// Trailing returns computed from an already-fetched series.
///
/// The last close is the current price; each horizon anchors on the close
/// nearest `as_of - horizon`. Fewer than two points gives all-absent.
pub fn momentum_from_series(series: &PriceSeries, as_of: DateTime<Utc>) -> MomentumResult {
    let mut result = MomentumResult::default();
    if series.len() < 2 {
        return result;
    }
    let Some(current) = series.last_close() else {
        return result;
    };

    for horizon in Horizon::ALL {
        let target = as_of - Duration::days(horizon.days());
        let anchor = nearest_close_within(series, target, DEFAULT_WINDOW_DAYS);
        result.set(horizon, percent_change(current, anchor));
    }
    result
}
