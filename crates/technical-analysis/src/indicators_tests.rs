#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use approx::assert_relative_eq;

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001); // (1+2+3)/3 = 2
        assert!((result[1] - 3.0).abs() < 0.001);
        assert!((result[2] - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let data = vec![1.0, 2.0];
        assert!(sma(&data, 5).is_empty());
        assert!(sma(&data, 0).is_empty());
    }

    #[test]
    fn test_gains_and_losses() {
        let (gains, losses) = gains_and_losses(&[10.0, 12.0, 11.0, 11.0]);
        assert_eq!(gains, vec![2.0, 0.0, 0.0]);
        assert_eq!(losses, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_rsi_in_range() {
        let value = rsi(&sample_prices(), 14).unwrap();
        assert!(value > 0.0 && value < 100.0);
    }

    #[test]
    fn test_rsi_uses_last_window_only() {
        // 14 deltas: 10 gains of 1.0 and 4 losses of 0.5
        let mut prices = vec![100.0];
        for i in 0..14 {
            let last = *prices.last().unwrap();
            prices.push(if i < 10 { last + 1.0 } else { last - 0.5 });
        }
        let avg_gain = 10.0 / 14.0;
        let avg_loss = 2.0 / 14.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);

        assert_relative_eq!(rsi(&prices, 14).unwrap(), expected, epsilon = 1e-9);

        // prepending an old crash does not move the rolling value
        let mut longer = vec![200.0];
        longer.extend_from_slice(&prices);
        assert_relative_eq!(rsi(&longer, 14).unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert!(rsi(&[1.0, 2.0, 3.0], 14).is_none());
        let prices: Vec<f64> = (0..13).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&prices, 14).is_none());
        assert!(rsi(&prices, 0).is_none());
    }

    #[test]
    fn test_rsi_with_exactly_period_prices() {
        // 13 deltas: 9 gains of 1.0 and 4 losses of 0.5; the first slot of
        // the window has no delta and counts as flat
        let mut prices = vec![100.0];
        for i in 0..13 {
            let last = *prices.last().unwrap();
            prices.push(if i < 9 { last + 1.0 } else { last - 0.5 });
        }
        assert_eq!(prices.len(), 14);

        let avg_gain = 9.0 / 14.0;
        let avg_loss = 2.0 / 14.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert_relative_eq!(rsi(&prices, 14).unwrap(), expected, epsilon = 1e-9);
        assert_relative_eq!(expected, 100.0 - 100.0 / 5.5, epsilon = 1e-9);
    }

    #[test]
    fn test_rsi_sample_window_of_fourteen() {
        let prices = &sample_prices()[..14];
        let value = rsi(prices, 14).unwrap();
        assert!(value > 50.0 && value < 100.0);
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let uptrend: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_relative_eq!(rsi(&uptrend, 14).unwrap(), 100.0);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let downtrend: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert_relative_eq!(rsi(&downtrend, 14).unwrap(), 0.0);
    }

    #[test]
    fn test_rsi_flat_is_undefined() {
        assert!(rsi(&[50.0; 20], 14).is_none());
    }
}
