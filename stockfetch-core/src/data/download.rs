//! Batch fetcher: resolves the range once, then drives one fetch state
//! machine per ticker with retry, rate limiting and cancellation.
//!
//! Per-ticker states:
//!
//! ```text
//! Pending -> Attempting(n) -> Success | Empty | Failed
//!                          -> RetryScheduled(n, delay) -> Attempting(n + 1)
//! ```
//!
//! A transient error on the last allowed attempt goes straight to `Failed`.
//! Errors never cross the per-ticker boundary: every input ticker gets
//! exactly one entry in the result map, in input order.

use super::provider::{DataError, DataProvider, DownloadProgress, FetchRequest};
use super::rate_limiter::RateLimiter;
use super::retry::RetryPolicy;
use crate::domain::{Bar, Interval, Ticker, TickerList};
use crate::range::{resolve, ResolveError, ResolvedRange};
use chrono::NaiveDate;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a ticker ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{0}")]
    Permanent(DataError),

    #[error("gave up after {attempts} attempts: {last}")]
    ExhaustedRetries { attempts: u32, last: DataError },
}

/// Terminal outcome for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success(Vec<Bar>),
    /// The provider answered without bars. Never retried.
    Empty,
    Failed(FetchError),
    /// Skipped because the batch was cancelled first.
    NotProcessed,
}

impl FetchResult {
    pub fn bars(&self) -> Option<&[Bar]> {
        match self {
            FetchResult::Success(bars) => Some(bars),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchResult::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            FetchResult::Success(_) => "success",
            FetchResult::Empty => "empty",
            FetchResult::Failed(_) => "failed",
            FetchResult::NotProcessed => "not processed",
        }
    }
}

/// Per-ticker fetch state.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Pending,
    Attempting {
        attempt: u32,
    },
    RetryScheduled {
        attempt: u32,
        delay: Duration,
        error: DataError,
    },
    Success(Vec<Bar>),
    Empty,
    Failed(FetchError),
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FetchState::Success(_) | FetchState::Empty | FetchState::Failed(_)
        )
    }

    /// `Pending` or `RetryScheduled` moves to the next `Attempting`.
    /// Any other state is returned unchanged.
    pub fn begin_attempt(self) -> Self {
        match self {
            FetchState::Pending => FetchState::Attempting { attempt: 1 },
            FetchState::RetryScheduled { attempt, .. } => FetchState::Attempting {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    /// Classify the outcome of the current attempt. Only meaningful from
    /// `Attempting`; other states are returned unchanged.
    pub fn after_attempt(self, outcome: Result<Vec<Bar>, DataError>, policy: &RetryPolicy) -> Self {
        let FetchState::Attempting { attempt } = self else {
            return self;
        };
        match outcome {
            Ok(bars) if bars.is_empty() => FetchState::Empty,
            Ok(bars) => FetchState::Success(bars),
            Err(error) if !error.is_transient() => {
                FetchState::Failed(FetchError::Permanent(error))
            }
            Err(error) if attempt >= policy.max_attempts() => {
                FetchState::Failed(FetchError::ExhaustedRetries {
                    attempts: attempt,
                    last: error,
                })
            }
            Err(error) => FetchState::RetryScheduled {
                attempt,
                delay: policy.backoff.delay_for(attempt, error.retry_after()),
                error,
            },
        }
    }

    /// Convert a terminal state into its result. A state that never reached
    /// a terminal state counts as not processed.
    pub fn into_result(self) -> FetchResult {
        match self {
            FetchState::Success(bars) => FetchResult::Success(bars),
            FetchState::Empty => FetchResult::Empty,
            FetchState::Failed(e) => FetchResult::Failed(e),
            _ => FetchResult::NotProcessed,
        }
    }
}

/// Shared cancellation flag, checked before each ticker starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub retry: RetryPolicy,
    /// 1 fetches sequentially; more runs tickers on a private thread pool.
    pub workers: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            workers: 1,
        }
    }
}

/// Counts per terminal outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
    pub not_processed: usize,
}

/// Results of a batch, one entry per input ticker in input order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub interval: Interval,
    /// `None` when the range could not be resolved.
    pub range: Option<ResolvedRange>,
    pub results: IndexMap<Ticker, FetchResult>,
}

impl BatchResult {
    pub fn summary(&self) -> BatchSummary {
        let mut s = BatchSummary {
            total: self.results.len(),
            ..BatchSummary::default()
        };
        for result in self.results.values() {
            match result {
                FetchResult::Success(_) => s.succeeded += 1,
                FetchResult::Empty => s.empty += 1,
                FetchResult::Failed(_) => s.failed += 1,
                FetchResult::NotProcessed => s.not_processed += 1,
            }
        }
        s
    }

    pub fn has_failures(&self) -> bool {
        self.results.values().any(FetchResult::is_failed)
    }

    pub fn get(&self, ticker: &str) -> Option<&FetchResult> {
        self.results
            .iter()
            .find(|(t, _)| t.as_str() == ticker)
            .map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Progress sink that ignores everything.
pub struct NoProgress;

impl DownloadProgress for NoProgress {
    fn on_start(&self, _ticker: &Ticker, _index: usize, _total: usize) {}
    fn on_complete(&self, _ticker: &Ticker, _index: usize, _total: usize, _result: &FetchResult) {}
    fn on_batch_complete(&self, _summary: &BatchSummary) {}
}

/// Drives a batch of tickers through the provider.
pub struct BatchFetcher<'a> {
    provider: &'a dyn DataProvider,
    limiter: &'a RateLimiter,
    progress: &'a dyn DownloadProgress,
    options: FetchOptions,
    cancel: CancelToken,
}

impl<'a> BatchFetcher<'a> {
    pub fn new(provider: &'a dyn DataProvider, limiter: &'a RateLimiter) -> Self {
        Self {
            provider,
            limiter,
            progress: &NoProgress,
            options: FetchOptions::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn DownloadProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch every ticker over `[start, end]` at `interval`.
    ///
    /// The range is resolved once against `today`; a clamp warning goes to
    /// the progress sink, a resolve error becomes `Failed` for every ticker.
    pub fn fetch_all(
        &self,
        tickers: &TickerList,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> BatchResult {
        let total = tickers.len();
        info!(
            provider = self.provider.name(),
            tickers = total,
            %interval,
            %start,
            %end,
            workers = self.options.workers,
            "starting batch"
        );

        let range = match resolve(interval, start, end, today) {
            Ok(range) => range,
            Err(e) => {
                warn!(error = %e, "date range rejected");
                let results: IndexMap<Ticker, FetchResult> = tickers
                    .iter()
                    .map(|t| (t.clone(), FetchResult::Failed(FetchError::Resolve(e.clone()))))
                    .collect();
                let batch = BatchResult {
                    interval,
                    range: None,
                    results,
                };
                self.progress.on_batch_complete(&batch.summary());
                return batch;
            }
        };

        if let Some(warning) = &range.warning {
            warn!(%warning, "requested range clamped");
            self.progress.on_range_clamped(warning);
        }

        let job = |(index, ticker): (usize, &Ticker)| {
            let result = self.fetch_ticker(ticker, index, total, interval, &range);
            (ticker.clone(), result)
        };

        let outcomes: Vec<(Ticker, FetchResult)> = if self.options.workers > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.workers)
                .thread_name(|i| format!("stockfetch-worker-{i}"))
                .build()
            {
                Ok(pool) => pool.install(|| {
                    tickers
                        .as_slice()
                        .par_iter()
                        .enumerate()
                        .map(job)
                        .collect()
                }),
                Err(e) => {
                    warn!(error = %e, "failed to build worker pool, fetching sequentially");
                    tickers.iter().enumerate().map(job).collect()
                }
            }
        } else {
            tickers.iter().enumerate().map(job).collect()
        };

        let batch = BatchResult {
            interval,
            range: Some(range),
            results: outcomes.into_iter().collect(),
        };
        let summary = batch.summary();
        info!(
            succeeded = summary.succeeded,
            empty = summary.empty,
            failed = summary.failed,
            not_processed = summary.not_processed,
            "batch complete"
        );
        self.progress.on_batch_complete(&summary);
        batch
    }

    /// Run one ticker's state machine to a terminal state.
    fn fetch_ticker(
        &self,
        ticker: &Ticker,
        index: usize,
        total: usize,
        interval: Interval,
        range: &ResolvedRange,
    ) -> FetchResult {
        if self.cancel.is_cancelled() {
            debug!(%ticker, "cancelled before start");
            return FetchResult::NotProcessed;
        }

        self.progress.on_start(ticker, index, total);

        let request = FetchRequest {
            ticker: ticker.clone(),
            interval,
            start: range.start,
            end: range.end,
        };

        let mut state = FetchState::Pending;
        self.progress.on_transition(ticker, &state);

        while !state.is_terminal() {
            state = state.begin_attempt();
            self.progress.on_transition(ticker, &state);

            let outcome = if self.provider.is_available() {
                self.limiter.acquire();
                self.provider.fetch(&request)
            } else {
                Err(DataError::CircuitBreakerTripped)
            };

            state = state.after_attempt(outcome, &self.options.retry);
            self.progress.on_transition(ticker, &state);

            if let FetchState::RetryScheduled { attempt, delay, error } = &state {
                debug!(%ticker, attempt, ?delay, %error, "retry scheduled");
                if !delay.is_zero() {
                    std::thread::sleep(*delay);
                }
            }
        }

        let result = state.into_result();
        match &result {
            FetchResult::Failed(e) => warn!(%ticker, error = %e, "fetch failed"),
            FetchResult::Empty => info!(%ticker, "no data returned"),
            FetchResult::Success(bars) => debug!(%ticker, bars = bars.len(), "fetched"),
            FetchResult::NotProcessed => {}
        }
        self.progress.on_complete(ticker, index, total, &result);
        result
    }
}
