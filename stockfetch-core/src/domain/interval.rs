//! Bar interval and its provider lookback policy.

use crate::range::{RangePreset, ResolveError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling granularity of a price bar, as accepted by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    M1,
    M2,
    M5,
    M15,
    M30,
    M60,
    M90,
    H1,
    #[default]
    D1,
    D5,
    W1,
    Mo1,
    Mo3,
}

impl Interval {
    /// Every interval, in menu order.
    pub const ALL: [Interval; 13] = [
        Interval::M1,
        Interval::M2,
        Interval::M5,
        Interval::M15,
        Interval::M30,
        Interval::M60,
        Interval::M90,
        Interval::H1,
        Interval::D1,
        Interval::D5,
        Interval::W1,
        Interval::Mo1,
        Interval::Mo3,
    ];

    /// Provider code, also used in output file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M2 => "2m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::M60 => "60m",
            Interval::M90 => "90m",
            Interval::H1 => "1h",
            Interval::D1 => "1d",
            Interval::D5 => "5d",
            Interval::W1 => "1wk",
            Interval::Mo1 => "1mo",
            Interval::Mo3 => "3mo",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Interval::M1 => "One minute intervals",
            Interval::M2 => "Two minute intervals",
            Interval::M5 => "Five minute intervals",
            Interval::M15 => "Fifteen minute intervals",
            Interval::M30 => "Thirty minute intervals",
            Interval::M60 | Interval::H1 => "Hourly intervals",
            Interval::M90 => "Ninety minute intervals",
            Interval::D1 => "Daily intervals",
            Interval::D5 => "Five day intervals",
            Interval::W1 => "Weekly intervals",
            Interval::Mo1 => "Monthly intervals",
            Interval::Mo3 => "Quarterly intervals",
        }
    }

    /// Maximum lookback in days, or `None` when the provider serves the full history.
    pub fn lookback_cap_days(self) -> Option<i64> {
        match self {
            Interval::M1 => Some(7),
            Interval::M2
            | Interval::M5
            | Interval::M15
            | Interval::M30
            | Interval::M60
            | Interval::M90
            | Interval::H1 => Some(60),
            Interval::D1 | Interval::D5 | Interval::W1 | Interval::Mo1 | Interval::Mo3 => None,
        }
    }

    pub fn is_intraday(self) -> bool {
        self.lookback_cap_days().is_some()
    }

    /// Human label for the lookback column of the interval listing.
    pub fn availability(self) -> String {
        match self.lookback_cap_days() {
            Some(days) => format!("Last {days} days"),
            None => "Maximum available".to_string(),
        }
    }

    /// Date-range choices that make sense for this interval.
    pub fn presets(self) -> &'static [RangePreset] {
        use RangePreset::*;
        match self {
            Interval::M1 => &[Last7Days],
            Interval::M2
            | Interval::M5
            | Interval::M15
            | Interval::M30
            | Interval::M60
            | Interval::M90
            | Interval::H1 => &[Last7Days, Last30Days, Last60Days],
            Interval::D1 => &[
                Last7Days,
                Last30Days,
                Last3Months,
                Last6Months,
                Last1Year,
                Last5Years,
                Custom,
            ],
            Interval::D5 => &[
                Last30Days,
                Last3Months,
                Last6Months,
                Last1Year,
                Last5Years,
                Custom,
            ],
            Interval::W1 => &[Last3Months, Last6Months, Last1Year, Last5Years, Custom],
            Interval::Mo1 => &[Last6Months, Last1Year, Last5Years, Custom],
            Interval::Mo3 => &[Last1Year, Last5Years, Custom],
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Interval::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == code)
            .ok_or_else(|| ResolveError::InvalidInterval(code.to_string()))
    }
}

impl TryFrom<String> for Interval {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(i: Interval) -> Self {
        i.as_str().to_string()
    }
}
