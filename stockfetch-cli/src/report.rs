//! End-of-run report and exit status.

use std::io::Write;
use std::path::Path;
use stockfetch_core::data::{BatchResult, FetchResult};
use stockfetch_core::output::{OutputError, TickerArtifacts, WriteResults};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;

/// Process exit code for a finished batch. A ticker whose files could not
/// be written counts as failed.
pub fn exit_code(batch: &BatchResult, written: &WriteResults, interrupted: bool) -> i32 {
    if interrupted {
        EXIT_INTERRUPTED
    } else if batch.has_failures() || write_errors(written) > 0 {
        EXIT_FAILED
    } else {
        EXIT_OK
    }
}

/// Print the summary panel and one row per ticker.
pub fn write_report(
    out: &mut dyn Write,
    batch: &BatchResult,
    written: &WriteResults,
    run_dir: Option<&Path>,
) -> std::io::Result<()> {
    let mut summary = batch.summary();
    let unsaved = write_errors(written);
    summary.succeeded = summary.succeeded.saturating_sub(unsaved);
    summary.failed += unsaved;

    writeln!(out, "\nCollection Summary")?;
    writeln!(out, "  Successfully processed: {}", summary.succeeded)?;
    writeln!(out, "  No data:                {}", summary.empty)?;
    writeln!(out, "  Failed:                 {}", summary.failed)?;
    if summary.not_processed > 0 {
        writeln!(out, "  Not processed:          {}", summary.not_processed)?;
    }
    match run_dir {
        Some(dir) => writeln!(out, "  Files location:         {}", dir.display())?,
        None => writeln!(out, "  Files location:         (nothing written)")?,
    }

    writeln!(out, "\n  {:<12} {:<16} Details", "Ticker", "Status")?;
    for (ticker, result) in &batch.results {
        let (status, details) = row(result, written.get(ticker));
        writeln!(out, "  {:<12} {status:<16} {details}", ticker.as_str())?;
    }
    Ok(())
}

fn write_errors(written: &WriteResults) -> usize {
    written.values().filter(|r| r.is_err()).count()
}

fn row(
    result: &FetchResult,
    written: Option<&Result<TickerArtifacts, OutputError>>,
) -> (&'static str, String) {
    match (result, written) {
        (FetchResult::Success(bars), Some(Ok(artifacts))) => {
            let mut files = vec![format!("Data: {}", file_name(&artifacts.data_file))];
            if !artifacts.chart_files.is_empty() {
                let charts: Vec<String> =
                    artifacts.chart_files.iter().map(|p| file_name(p)).collect();
                files.push(format!("Charts: {}", charts.join(", ")));
            }
            match &artifacts.chart_error {
                Some(e) => (
                    "Partial Success",
                    format!("{} bars; data saved, but chart generation failed: {e}", bars.len()),
                ),
                None => ("Success", format!("{} bars; {}", bars.len(), files.join("; "))),
            }
        }
        (FetchResult::Success(_), Some(Err(e))) => ("Write Error", e.to_string()),
        (FetchResult::Success(bars), None) => ("Success", format!("{} bars (not saved)", bars.len())),
        (FetchResult::Empty, _) => ("No Data", "provider returned no bars for this range".into()),
        (FetchResult::Failed(e), _) => ("Error", e.to_string()),
        (FetchResult::NotProcessed, _) => ("Not Processed", "run interrupted before this ticker".into()),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indexmap::IndexMap;
    use std::path::PathBuf;
    use stockfetch_core::data::{DataError, FetchError};
    use stockfetch_core::domain::{Bar, Interval, Ticker};

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1,
        }
    }

    fn batch(entries: Vec<(&str, FetchResult)>) -> BatchResult {
        BatchResult {
            interval: Interval::D1,
            range: None,
            results: entries.into_iter().map(|(s, r)| (t(s), r)).collect(),
        }
    }

    #[test]
    fn exit_codes() {
        let ok = batch(vec![("AAPL", FetchResult::Success(vec![bar()])), ("IPO", FetchResult::Empty)]);
        let none = WriteResults::new();
        assert_eq!(exit_code(&ok, &none, false), EXIT_OK);
        assert_eq!(exit_code(&ok, &none, true), EXIT_INTERRUPTED);

        let failed = batch(vec![(
            "ZZZZINVALID",
            FetchResult::Failed(FetchError::Permanent(DataError::SymbolNotFound {
                symbol: "ZZZZINVALID".into(),
            })),
        )]);
        assert_eq!(exit_code(&failed, &none, false), EXIT_FAILED);
    }

    #[test]
    fn unsaved_ticker_counts_as_failed() {
        let b = batch(vec![
            ("AAPL", FetchResult::Success(vec![bar()])),
            ("MSFT", FetchResult::Success(vec![bar()])),
        ]);
        let mut written = IndexMap::new();
        written.insert(
            t("AAPL"),
            Ok(TickerArtifacts {
                data_file: PathBuf::from("data/x/AAPL/data/AAPL_1d.csv"),
                chart_files: vec![],
                chart_error: None,
            }),
        );
        written.insert(
            t("MSFT"),
            Err(OutputError::Io {
                path: PathBuf::from("data/x/MSFT/data/MSFT_1d.csv"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            }),
        );

        assert!(!b.has_failures());
        assert_eq!(exit_code(&b, &written, false), EXIT_FAILED);

        let mut out = Vec::new();
        write_report(&mut out, &b, &written, Some(Path::new("data/x"))).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Successfully processed: 1"));
        assert!(text.contains("Failed:                 1"));
        assert!(text.contains("Write Error"));
    }

    #[test]
    fn report_lists_each_outcome() {
        let b = batch(vec![
            ("AAPL", FetchResult::Success(vec![bar(), bar()])),
            ("TSLA", FetchResult::Success(vec![bar()])),
            ("IPO", FetchResult::Empty),
            (
                "ZZZZ",
                FetchResult::Failed(FetchError::ExhaustedRetries {
                    attempts: 4,
                    last: DataError::ServerError { status: 503 },
                }),
            ),
            ("LATE", FetchResult::NotProcessed),
        ]);
        let mut written = IndexMap::new();
        written.insert(
            t("AAPL"),
            Ok(TickerArtifacts {
                data_file: PathBuf::from("data/x/AAPL/data/AAPL_1d.csv"),
                chart_files: vec![PathBuf::from("data/x/AAPL/charts/AAPL_candlestick.html")],
                chart_error: None,
            }),
        );
        written.insert(
            t("TSLA"),
            Ok(TickerArtifacts {
                data_file: PathBuf::from("data/x/TSLA/data/TSLA_1d.csv"),
                chart_files: vec![],
                chart_error: Some("technical chart: no bars to chart".into()),
            }),
        );

        let mut out = Vec::new();
        write_report(&mut out, &b, &written, Some(Path::new("data/x"))).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Successfully processed: 2"));
        assert!(text.contains("Not processed:          1"));
        assert!(text.contains("Files location:         data/x"));
        assert!(text.contains("Data: AAPL_1d.csv; Charts: AAPL_candlestick.html"));
        assert!(text.contains("Partial Success"));
        assert!(text.contains("gave up after 4 attempts: provider returned HTTP 503"));
        assert!(text.contains("Not Processed"));
    }
}
