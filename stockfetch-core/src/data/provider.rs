//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources so the batch fetcher can
//! be driven by Yahoo Finance in production and by a scripted fake in tests.

use crate::data::download::{BatchSummary, FetchResult, FetchState};
use crate::domain::{Bar, Interval, Ticker};
use crate::range::ClampWarning;
use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

/// Structured error types for a single provider request.
///
/// These are designed to be displayable in the run summary. Each variant is
/// either transient (worth retrying) or permanent, see [`DataError::is_transient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider returned HTTP {status}")]
    ServerError { status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Transient errors are retried with backoff; permanent ones fail the ticker at once.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_)
                | DataError::RateLimited { .. }
                | DataError::ServerError { .. }
        )
    }

    /// Provider-suggested wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DataError::RateLimited { retry_after_secs } => {
                Some(Duration::from_secs(*retry_after_secs))
            }
            _ => None,
        }
    }
}

/// One provider call: a ticker at an interval over `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticker: Ticker,
    pub interval: Interval,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Trait for market data providers.
///
/// `Ok` with an empty vector means the provider answered but has no bars for
/// the range. Retrying and rate limiting live above this trait.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Issue exactly one request for the given ticker, interval and range.
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Bar>, DataError>;

    /// Check if the provider is currently available (not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

/// Progress callback for multi-ticker operations.
pub trait DownloadProgress: Send + Sync {
    /// Called once, before any request, when the range had to be clamped.
    fn on_range_clamped(&self, _warning: &ClampWarning) {}

    /// Called when starting to fetch a ticker.
    fn on_start(&self, ticker: &Ticker, index: usize, total: usize);

    /// Called on every state change of a ticker's fetch.
    fn on_transition(&self, _ticker: &Ticker, _state: &FetchState) {}

    /// Called when a ticker reaches a terminal state.
    fn on_complete(&self, ticker: &Ticker, index: usize, total: usize, result: &FetchResult);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, summary: &BatchSummary);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_range_clamped(&self, warning: &ClampWarning) {
        println!("Note: {warning}");
    }

    fn on_start(&self, ticker: &Ticker, index: usize, total: usize) {
        println!("[{}/{}] Fetching {ticker}...", index + 1, total);
    }

    fn on_transition(&self, ticker: &Ticker, state: &FetchState) {
        if let FetchState::RetryScheduled { attempt, delay, error } = state {
            println!(
                "  RETRY: {ticker} attempt {attempt} failed ({error}), retrying in {:.1}s",
                delay.as_secs_f64()
            );
        }
    }

    fn on_complete(&self, ticker: &Ticker, _index: usize, _total: usize, result: &FetchResult) {
        match result {
            FetchResult::Success(bars) => println!("  OK: {ticker} ({} bars)", bars.len()),
            FetchResult::Empty => println!("  EMPTY: {ticker}: no data for this range"),
            FetchResult::Failed(e) => println!("  FAIL: {ticker}: {e}"),
            FetchResult::NotProcessed => println!("  SKIPPED: {ticker}"),
        }
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        println!(
            "\nDownload complete: {}/{} succeeded, {} empty, {} failed, {} not processed",
            summary.succeeded, summary.total, summary.empty, summary.failed, summary.not_processed
        );
    }
}
