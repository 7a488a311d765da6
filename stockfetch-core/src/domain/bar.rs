//! Bar: one OHLCV record as returned by the provider.

use super::Interval;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol at a single timestamp.
///
/// `timestamp` is in the exchange's local time. Daily-or-coarser bars carry
/// midnight of the session date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (provider sent a partial bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Close below open. Drives the red/green volume colouring in charts.
    pub fn is_down(&self) -> bool {
        self.close < self.open
    }

    /// Timestamp rendered for CSV and chart axes: a plain date for
    /// daily-or-coarser intervals, date and time for intraday.
    pub fn label(&self, interval: Interval) -> String {
        if interval.is_intraday() {
            self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
        } else {
            self.timestamp.date().format("%Y-%m-%d").to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
        assert!(!sample_bar().is_down());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn label_depends_on_interval() {
        let bar = sample_bar();
        assert_eq!(bar.label(Interval::D1), "2024-01-02");
        assert_eq!(bar.label(Interval::M5), "2024-01-02 09:30:00");
    }
}
