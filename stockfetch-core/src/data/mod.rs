//! Market data retrieval: provider, rate limiting, retry, batch fetching.

pub mod circuit_breaker;
pub mod download;
pub mod provider;
pub mod rate_limiter;
pub mod retry;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use download::{
    BatchFetcher, BatchResult, BatchSummary, CancelToken, FetchError, FetchOptions, FetchResult,
    FetchState, NoProgress,
};
pub use provider::{DataError, DataProvider, DownloadProgress, FetchRequest, StdoutProgress};
pub use rate_limiter::RateLimiter;
pub use retry::{BackoffPolicy, RetryPolicy};
pub use yahoo::YahooProvider;
