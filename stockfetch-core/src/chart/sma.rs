//! Simple Moving Average over bar closes.
//!
//! Lookback: period - 1 (first valid value at index period-1). Positions
//! without a full window, or whose window contains a NaN close, are NaN.

use crate::domain::Bar;

pub fn sma(bars: &[Bar], period: usize) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    // Rolling sum over finite closes plus a count of NaNs in the window,
    // so a NaN leaving the window stops poisoning the sum.
    let mut sum = 0.0;
    let mut nans = 0usize;
    for (i, bar) in bars.iter().enumerate() {
        if bar.close.is_nan() {
            nans += 1;
        } else {
            sum += bar.close;
        }

        if i >= period {
            let leaving = bars[i - period].close;
            if leaving.is_nan() {
                nans -= 1;
            } else {
                sum -= leaving;
            }
        }

        if i + 1 >= period && nans == 0 {
            result[i] = sum / period as f64;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EPS: f64 = 1e-9;

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1,
            })
            .collect()
    }

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = sma(&bars, 5);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        // mean(10..=14) = 12, then 13, 14
        assert!((result[4] - 12.0).abs() < EPS);
        assert!((result[5] - 13.0).abs() < EPS);
        assert!((result[6] - 14.0).abs() < EPS);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        assert_eq!(sma(&bars, 1), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_nan_propagation() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        bars[2].close = f64::NAN;
        let result = sma(&bars, 3);
        // windows touching index 2 are NaN
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        // [13,14,15]
        assert!((result[5] - 14.0).abs() < EPS);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        assert!(sma(&bars, 5).iter().all(|v| v.is_nan()));
        assert!(sma(&bars, 0).iter().all(|v| v.is_nan()));
    }
}
