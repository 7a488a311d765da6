//! Bar series as CSV.

use super::OutputError;
use crate::domain::{Bar, Interval};
use std::path::Path;

pub const CSV_HEADER: [&str; 6] = ["datetime", "open", "high", "low", "close", "volume"];

/// Render bars as CSV with a fixed column order. Missing prices are left blank.
pub fn bars_to_csv(bars: &[Bar], interval: Interval) -> Result<String, OutputError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;

    for b in bars {
        wtr.write_record([
            &b.label(interval),
            &price(b.open),
            &price(b.high),
            &price(b.low),
            &price(b.close),
            &b.volume.to_string(),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| OutputError::Csv(e.to_string()))?;
    String::from_utf8(data).map_err(|e| OutputError::Csv(e.to_string()))
}

/// Write bars to `path`, creating parent directories.
pub fn write_bars_csv(path: &Path, bars: &[Bar], interval: Interval) -> Result<(), OutputError> {
    let body = bars_to_csv(bars, interval)?;
    super::write_file(path, body.as_bytes())
}

fn price(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(h: u32, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(h, 30, 0)
                .unwrap(),
            open: 185.25,
            high: 186.5,
            low: 184.0,
            close,
            volume: 1200,
        }
    }

    #[test]
    fn header_and_daily_rows() {
        let csv = bars_to_csv(&[bar(0, 185.75)], Interval::D1).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "datetime,open,high,low,close,volume");
        assert_eq!(lines[1], "2024-01-02,185.25,186.5,184,185.75,1200");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn intraday_rows_keep_time() {
        let csv = bars_to_csv(&[bar(9, 185.0), bar(10, 186.0)], Interval::M30).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2024-01-02 09:30:00,"));
        assert!(lines[2].starts_with("2024-01-02 10:30:00,"));
    }

    #[test]
    fn nan_close_is_blank() {
        let csv = bars_to_csv(&[bar(0, f64::NAN)], Interval::D1).unwrap();
        assert_eq!(csv.lines().nth(1), Some("2024-01-02,185.25,186.5,184,,1200"));
    }

    #[test]
    fn empty_series_is_header_only() {
        let csv = bars_to_csv(&[], Interval::D1).unwrap();
        assert_eq!(csv, "datetime,open,high,low,close,volume\n");
    }
}
