//! Application configuration, stored as TOML.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working configuration:
//!
//! ```toml
//! [fetch]
//! max_retries = 3
//! rate_limit_ms = 500
//!
//! [output]
//! root_dir = "data"
//!
//! [charts]
//! enabled = true
//! ma_periods = [20, 50, 200]
//!
//! [input]
//! ticker_file = "input_tickers/input_tickers.txt"
//! default_interval = "1d"
//! ```

use crate::chart::ChartOptions;
use crate::data::{BackoffPolicy, FetchOptions, RateLimiter, RetryPolicy};
use crate::domain::Interval;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    pub charts: ChartsConfig,
    pub input: InputConfig,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Retry, pacing and concurrency knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
    /// Minimum spacing between outbound requests.
    pub rate_limit_ms: u64,
    pub workers: usize,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            max_retries: retry.max_retries,
            base_delay_ms: retry.backoff.base_delay.as_millis() as u64,
            max_delay_ms: retry.backoff.max_delay.as_millis() as u64,
            jitter: retry.backoff.jitter,
            rate_limit_ms: 500,
            workers: 1,
            timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: BackoffPolicy {
                base_delay: Duration::from_millis(self.base_delay_ms),
                max_delay: Duration::from_millis(self.max_delay_ms),
                jitter: self.jitter,
            },
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            retry: self.retry_policy(),
            workers: self.workers.max(1),
        }
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(Duration::from_millis(self.rate_limit_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub root_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    pub enabled: bool,
    pub include_volume: bool,
    pub ma_periods: Vec<usize>,
    pub height: u32,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        let options = ChartOptions::default();
        Self {
            enabled: true,
            include_volume: options.include_volume,
            ma_periods: options.ma_periods,
            height: options.height,
        }
    }
}

impl ChartsConfig {
    pub fn options(&self) -> ChartOptions {
        ChartOptions {
            include_volume: self.include_volume,
            ma_periods: self.ma_periods.clone(),
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub ticker_file: PathBuf,
    pub default_interval: Interval,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            ticker_file: PathBuf::from("input_tickers/input_tickers.txt"),
            default_interval: Interval::D1,
        }
    }
}
