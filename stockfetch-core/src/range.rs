//! Interval-aware date-range resolution.
//!
//! Intraday intervals are only served for a bounded window before today
//! (7 days for `1m`, 60 days for the other intraday codes). Requests reaching
//! further back are clamped to that window and a [`ClampWarning`] is handed
//! back to the caller. Daily-or-coarser intervals pass through unchanged.

use crate::domain::Interval;
use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Earliest start used for "maximum available" on uncapped intervals.
pub fn earliest_history() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(
        "unsupported interval '{0}' (expected one of 1m, 2m, 5m, 15m, 30m, 60m, 90m, 1h, 1d, 5d, 1wk, 1mo, 3mo)"
    )]
    InvalidInterval(String),

    #[error("invalid date range: start {start} is not before end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error(
        "empty date range: {interval} data only reaches back to {earliest}, which is not before the requested end {end}"
    )]
    EmptyRange {
        interval: Interval,
        earliest: NaiveDate,
        end: NaiveDate,
    },

    #[error("custom range selected but no start date given")]
    MissingStart,
}

/// Named relative ranges offered per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    Last7Days,
    Last30Days,
    Last60Days,
    Last3Months,
    Last6Months,
    Last1Year,
    Last5Years,
    Custom,
}

impl RangePreset {
    pub const ALL: [RangePreset; 8] = [
        RangePreset::Last7Days,
        RangePreset::Last30Days,
        RangePreset::Last60Days,
        RangePreset::Last3Months,
        RangePreset::Last6Months,
        RangePreset::Last1Year,
        RangePreset::Last5Years,
        RangePreset::Custom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RangePreset::Last7Days => "Last 7 days",
            RangePreset::Last30Days => "Last 30 days",
            RangePreset::Last60Days => "Last 60 days",
            RangePreset::Last3Months => "Last 3 months",
            RangePreset::Last6Months => "Last 6 months",
            RangePreset::Last1Year => "Last 1 year",
            RangePreset::Last5Years => "Last 5 years",
            RangePreset::Custom => "Custom range",
        }
    }

    /// Command-line spelling, e.g. `last-30-days`.
    pub fn slug(self) -> &'static str {
        match self {
            RangePreset::Last7Days => "last-7-days",
            RangePreset::Last30Days => "last-30-days",
            RangePreset::Last60Days => "last-60-days",
            RangePreset::Last3Months => "last-3-months",
            RangePreset::Last6Months => "last-6-months",
            RangePreset::Last1Year => "last-1-year",
            RangePreset::Last5Years => "last-5-years",
            RangePreset::Custom => "custom",
        }
    }

    /// Start date relative to `today`. `None` for [`RangePreset::Custom`].
    pub fn start_from(self, today: NaiveDate) -> Option<NaiveDate> {
        let months_back = |m: u32| today.checked_sub_months(Months::new(m));
        match self {
            RangePreset::Last7Days => Some(today - Duration::days(7)),
            RangePreset::Last30Days => Some(today - Duration::days(30)),
            RangePreset::Last60Days => Some(today - Duration::days(60)),
            RangePreset::Last3Months => months_back(3),
            RangePreset::Last6Months => months_back(6),
            RangePreset::Last1Year => months_back(12),
            RangePreset::Last5Years => months_back(60),
            RangePreset::Custom => None,
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        RangePreset::ALL
            .iter()
            .copied()
            .find(|p| p.slug() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = RangePreset::ALL.iter().map(|p| p.slug()).collect();
                format!("unknown range preset '{s}'. Valid: {}", valid.join(", "))
            })
    }
}

/// What the user asked for, before resolution against an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// A named range ending today.
    Preset(RangePreset),
    /// Explicit dates; a missing end means today.
    Between {
        start: NaiveDate,
        end: Option<NaiveDate>,
    },
    /// Everything the provider has for the interval.
    Max,
}

impl RangeRequest {
    /// Default selection for an interval: its first preset.
    pub fn default_for(interval: Interval) -> Self {
        interval
            .presets()
            .first()
            .copied()
            .map(RangeRequest::Preset)
            .unwrap_or(RangeRequest::Max)
    }

    /// Turn the request into concrete calendar dates.
    pub fn to_dates(
        &self,
        interval: Interval,
        today: NaiveDate,
    ) -> Result<(NaiveDate, NaiveDate), ResolveError> {
        match *self {
            RangeRequest::Preset(preset) => {
                let start = preset.start_from(today).ok_or(ResolveError::MissingStart)?;
                Ok((start, today))
            }
            RangeRequest::Between { start, end } => Ok((start, end.unwrap_or(today))),
            RangeRequest::Max => {
                let start = match interval.lookback_cap_days() {
                    Some(cap) => today - Duration::days(cap),
                    None => earliest_history(),
                };
                Ok((start, today))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RangeRequest::Preset(p) => p.label().to_string(),
            RangeRequest::Between { start, end: Some(end) } => format!("{start} to {end}"),
            RangeRequest::Between { start, end: None } => format!("{start} to today"),
            RangeRequest::Max => "Maximum available".to_string(),
        }
    }
}

/// Non-fatal notice that the requested start was pulled forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClampWarning {
    pub interval: Interval,
    pub requested_start: NaiveDate,
    pub effective_start: NaiveDate,
    pub cap_days: i64,
}

impl fmt::Display for ClampWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "adjusted start date from {} to {} due to {} interval limitations (last {} days only)",
            self.requested_start, self.effective_start, self.interval, self.cap_days
        )
    }
}

/// Effective range after validation and clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub warning: Option<ClampWarning>,
}

impl ResolvedRange {
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Validate `[start, end)` for `interval` and clamp it to the interval's lookback cap.
///
/// An end date after `today` is pulled back to `today`.
pub fn resolve(
    interval: Interval,
    requested_start: NaiveDate,
    requested_end: NaiveDate,
    today: NaiveDate,
) -> Result<ResolvedRange, ResolveError> {
    if requested_start >= requested_end {
        return Err(ResolveError::InvalidRange {
            start: requested_start,
            end: requested_end,
        });
    }

    let end = requested_end.min(today);
    if requested_start >= end {
        return Err(ResolveError::InvalidRange {
            start: requested_start,
            end,
        });
    }

    let Some(cap_days) = interval.lookback_cap_days() else {
        return Ok(ResolvedRange {
            start: requested_start,
            end,
            warning: None,
        });
    };

    let earliest = today - Duration::days(cap_days);
    if requested_start >= earliest {
        return Ok(ResolvedRange {
            start: requested_start,
            end,
            warning: None,
        });
    }

    if earliest >= end {
        return Err(ResolveError::EmptyRange {
            interval,
            earliest,
            end,
        });
    }

    Ok(ResolvedRange {
        start: earliest,
        end,
        warning: Some(ClampWarning {
            interval,
            requested_start,
            effective_start: earliest,
            cap_days,
        }),
    })
}

/// [`RangeRequest::to_dates`] followed by [`resolve`].
pub fn resolve_request(
    interval: Interval,
    request: &RangeRequest,
    today: NaiveDate,
) -> Result<ResolvedRange, ResolveError> {
    let (start, end) = request.to_dates(interval, today)?;
    resolve(interval, start, end, today)
}
