//! Output tree written for a batch: CSV per ticker, charts, partial success.

use chrono::NaiveDate;
use indexmap::IndexMap;
use std::fs;
use stockfetch_core::chart::{ChartError, ChartKind, ChartRenderer, PlotlyHtmlRenderer};
use stockfetch_core::data::{BatchResult, DataError, FetchError, FetchResult};
use stockfetch_core::domain::{Bar, Interval, Ticker};
use stockfetch_core::output::{write_batch, write_ticker, RunContext};

fn started() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 14)
        .unwrap()
        .and_hms_opt(16, 5, 9)
        .unwrap()
}

fn bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 3)
                .unwrap()
                .and_hms_opt(9, 30 + i as u32, 0)
                .unwrap(),
            open: 10.0,
            high: 11.0,
            low: 9.5,
            close: 10.5,
            volume: 100,
        })
        .collect()
}

fn t(s: &str) -> Ticker {
    Ticker::new(s).unwrap()
}

/// Renders the candlestick chart and fails the technical one.
struct HalfBrokenRenderer;

impl ChartRenderer for HalfBrokenRenderer {
    fn render(
        &self,
        kind: ChartKind,
        _bars: &[Bar],
        ticker: &Ticker,
        _interval: Interval,
    ) -> Result<String, ChartError> {
        match kind {
            ChartKind::Candlestick => Ok(format!("<html>{ticker}</html>")),
            ChartKind::Technical => Err(ChartError::Serialize("boom".into())),
        }
    }
}

#[test]
fn writes_csv_and_both_charts_under_run_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = RunContext::new(tmp.path(), started());
    let renderer = PlotlyHtmlRenderer::default();

    let artifacts = write_ticker(&ctx, &t("AAPL"), Interval::M5, &bars(3), Some(&renderer)).unwrap();

    let run = tmp.path().join("20240614_160509").join("AAPL");
    assert_eq!(artifacts.data_file, run.join("data").join("AAPL_5m.csv"));
    assert_eq!(
        artifacts.chart_files,
        vec![
            run.join("charts").join("AAPL_candlestick.html"),
            run.join("charts").join("AAPL_technical.html"),
        ]
    );
    assert!(!artifacts.is_partial());

    let csv = fs::read_to_string(&artifacts.data_file).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "datetime,open,high,low,close,volume");
    assert_eq!(lines[1], "2024-06-03 09:30:00,10,11,9.5,10.5,100");
    assert_eq!(lines.len(), 4);

    let html = fs::read_to_string(&artifacts.chart_files[1]).unwrap();
    assert!(html.contains("AAPL Technical Analysis"));
    assert!(html.contains("2024-06-03 09:32:00"));
}

#[test]
fn charts_disabled_writes_only_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = RunContext::new(tmp.path(), started());

    let artifacts = write_ticker(&ctx, &t("MSFT"), Interval::D1, &bars(2), None).unwrap();

    assert!(artifacts.data_file.exists());
    assert!(artifacts.chart_files.is_empty());
    assert!(!ctx.ticker_dir(&t("MSFT")).join("charts").exists());
}

#[test]
fn chart_failure_is_partial_success() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = RunContext::new(tmp.path(), started());

    let artifacts =
        write_ticker(&ctx, &t("TSLA"), Interval::D1, &bars(2), Some(&HalfBrokenRenderer)).unwrap();

    assert!(artifacts.data_file.exists());
    assert_eq!(artifacts.chart_files.len(), 1);
    assert!(artifacts.is_partial());
    assert!(artifacts
        .chart_error
        .as_deref()
        .is_some_and(|e| e.contains("technical")));
}

#[test]
fn batch_writes_only_successful_tickers() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = RunContext::new(tmp.path(), started());

    let mut results = IndexMap::new();
    results.insert(t("AAPL"), FetchResult::Success(bars(2)));
    results.insert(t("IPO"), FetchResult::Empty);
    results.insert(
        t("ZZZZ"),
        FetchResult::Failed(FetchError::Permanent(DataError::SymbolNotFound {
            symbol: "ZZZZ".into(),
        })),
    );
    results.insert(t("LATE"), FetchResult::NotProcessed);
    let batch = BatchResult {
        interval: Interval::D1,
        range: None,
        results,
    };

    let written = write_batch(&ctx, &batch, None);

    assert_eq!(written.len(), 1);
    assert!(written.get(&t("AAPL")).is_some_and(|r| r.is_ok()));
    assert!(ctx.data_file(&t("AAPL"), Interval::D1).exists());
    assert!(!ctx.ticker_dir(&t("IPO")).exists());
    assert!(!ctx.ticker_dir(&t("ZZZZ")).exists());
}

#[test]
fn unwritable_root_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();
    let ctx = RunContext::new(&blocker, started());

    assert!(ctx.create().is_err());
    assert!(write_ticker(&ctx, &t("AAPL"), Interval::D1, &bars(1), None).is_err());
}
