/// Default RSI lookback
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    data.windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Split consecutive price changes into gains and losses (both non-negative)
pub fn gains_and_losses(data: &[f64]) -> (Vec<f64>, Vec<f64>) {
    data.windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip()
}

/// Relative Strength Index of the latest bar.
///
/// Uses a simple rolling mean of the last `period` gains and losses rather
/// than Wilder smoothing. Needs at least `period` prices; with exactly
/// `period` prices the missing leading change counts as flat. A flat window
/// (no gains and no losses) has no defined RSI and yields `None`.
pub fn rsi(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }

    let (mut gains, mut losses) = gains_and_losses(data);
    if gains.len() < period {
        gains.insert(0, 0.0);
        losses.insert(0, 0.0);
    }
    let avg_gain = *sma(&gains, period).last()?;
    let avg_loss = *sma(&losses, period).last()?;

    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}
