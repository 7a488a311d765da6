//! Persisting fetched series: CSV per ticker plus optional charts.

pub mod csv;
pub mod run_context;

pub use self::csv::{bars_to_csv, write_bars_csv, CSV_HEADER};
pub use run_context::RunContext;

use crate::chart::{ChartError, ChartKind, ChartRenderer};
use crate::data::BatchResult;
use crate::domain::{Bar, Interval, Ticker};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<::csv::Error> for OutputError {
    fn from(e: ::csv::Error) -> Self {
        OutputError::Csv(e.to_string())
    }
}

/// Files written for one ticker.
#[derive(Debug, Default)]
pub struct TickerArtifacts {
    pub data_file: PathBuf,
    pub chart_files: Vec<PathBuf>,
    /// Set when the CSV landed but a chart did not.
    pub chart_error: Option<String>,
}

impl TickerArtifacts {
    pub fn is_partial(&self) -> bool {
        self.chart_error.is_some()
    }
}

/// Write the CSV and, when a renderer is given, both charts for one ticker.
///
/// A CSV failure is an error. A chart failure is recorded on the artifacts
/// and the remaining chart is still attempted.
pub fn write_ticker(
    ctx: &RunContext,
    ticker: &Ticker,
    interval: Interval,
    bars: &[Bar],
    renderer: Option<&dyn ChartRenderer>,
) -> Result<TickerArtifacts, OutputError> {
    let data_file = ctx.data_file(ticker, interval);
    write_bars_csv(&data_file, bars, interval)?;
    debug!(%ticker, path = %data_file.display(), rows = bars.len(), "wrote csv");

    let mut artifacts = TickerArtifacts {
        data_file,
        ..TickerArtifacts::default()
    };

    let Some(renderer) = renderer else {
        return Ok(artifacts);
    };

    for kind in ChartKind::ALL {
        match write_chart(ctx, renderer, kind, ticker, interval, bars) {
            Ok(path) => artifacts.chart_files.push(path),
            Err(e) => {
                warn!(%ticker, %kind, error = %e, "chart generation failed");
                let msg = format!("{kind} chart: {e}");
                artifacts.chart_error = Some(match artifacts.chart_error.take() {
                    Some(prev) => format!("{prev}; {msg}"),
                    None => msg,
                });
            }
        }
    }
    Ok(artifacts)
}

/// Per-ticker write outcome for the successful tickers of a batch.
pub type WriteResults = IndexMap<Ticker, Result<TickerArtifacts, OutputError>>;

/// Write every successful ticker of a batch. Other outcomes write nothing.
pub fn write_batch(
    ctx: &RunContext,
    batch: &BatchResult,
    renderer: Option<&dyn ChartRenderer>,
) -> WriteResults {
    batch
        .results
        .iter()
        .filter_map(|(ticker, result)| {
            let bars = result.bars()?;
            let written = write_ticker(ctx, ticker, batch.interval, bars, renderer);
            if let Err(e) = &written {
                warn!(%ticker, error = %e, "failed to write output");
            }
            Some((ticker.clone(), written))
        })
        .collect()
}

#[derive(Debug, Error)]
enum ChartWriteError {
    #[error(transparent)]
    Render(#[from] ChartError),
    #[error(transparent)]
    Write(#[from] OutputError),
}

fn write_chart(
    ctx: &RunContext,
    renderer: &dyn ChartRenderer,
    kind: ChartKind,
    ticker: &Ticker,
    interval: Interval,
    bars: &[Bar],
) -> Result<PathBuf, ChartWriteError> {
    let html = renderer.render(kind, bars, ticker, interval)?;
    let path = ctx.chart_file(ticker, kind);
    write_file(&path, html.as_bytes())?;
    Ok(path)
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
