//! Ticker symbols and ticker-list parsing.
//!
//! Tickers come either from an input file (one per line, `#` comments) or from
//! a comma-separated list typed by the user. Both paths normalize to uppercase
//! and drop duplicates while keeping the first occurrence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// A validated, uppercase stock symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("empty ticker symbol")]
    Empty,

    #[error("invalid ticker symbol '{0}'")]
    InvalidSymbol(String),

    #[error("no tickers given")]
    NoTickers,

    #[error("read ticker file {path}: {reason}")]
    Io { path: String, reason: String },
}

impl Ticker {
    /// Normalize and validate a raw symbol (`" aapl "` becomes `AAPL`).
    pub fn new(raw: &str) -> Result<Self, TickerError> {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(TickerError::Empty);
        }
        // Yahoo symbols: letters, digits, and `.^=-` for classes, indices, FX and futures.
        let valid = symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'));
        if !valid {
            return Err(TickerError::InvalidSymbol(raw.trim().to_string()));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Ticker> for String {
    fn from(t: Ticker) -> Self {
        t.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, duplicate-free list of tickers for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerList(Vec<Ticker>);

impl TickerList {
    /// Build from already-validated tickers, dropping repeats.
    pub fn from_tickers(tickers: impl IntoIterator<Item = Ticker>) -> Self {
        let mut out: Vec<Ticker> = Vec::new();
        for t in tickers {
            if !out.contains(&t) {
                out.push(t);
            }
        }
        Self(out)
    }

    /// Parse a comma-separated list such as `"aapl, msft,GOOGL"`.
    pub fn parse_csv(input: &str) -> Result<Self, TickerError> {
        let tickers = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Ticker::new)
            .collect::<Result<Vec<_>, _>>()?;
        if tickers.is_empty() {
            return Err(TickerError::NoTickers);
        }
        Ok(Self::from_tickers(tickers))
    }

    /// Parse ticker-file contents: one symbol per line, `#` starts a comment,
    /// blank lines ignored.
    pub fn parse_lines(content: &str) -> Result<Self, TickerError> {
        let tickers = content
            .lines()
            .map(|line| line.split('#').next().unwrap_or("").trim())
            .filter(|s| !s.is_empty())
            .map(Ticker::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_tickers(tickers))
    }

    /// Read and parse a ticker file. A missing file is an error; an empty one
    /// yields an empty list.
    pub fn from_file(path: &Path) -> Result<Self, TickerError> {
        let content = std::fs::read_to_string(path).map_err(|e| TickerError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse_lines(&content)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ticker> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Ticker] {
        &self.0
    }

    /// Comma-joined form, as shown in selection summaries.
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(Ticker::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'a> IntoIterator for &'a TickerList {
    type Item = &'a Ticker;
    type IntoIter = std::slice::Iter<'a, Ticker>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(Ticker::new("  aapl ").unwrap().as_str(), "AAPL");
        assert_eq!(Ticker::new("brk.b").unwrap().as_str(), "BRK.B");
        assert_eq!(Ticker::new("^gspc").unwrap().as_str(), "^GSPC");
    }

    #[test]
    fn rejects_bad_symbols() {
        assert_eq!(Ticker::new("   "), Err(TickerError::Empty));
        assert!(matches!(
            Ticker::new("AA PL"),
            Err(TickerError::InvalidSymbol(_))
        ));
        assert!(matches!(
            Ticker::new("AAPL;rm"),
            Err(TickerError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn csv_list_dedupes_in_order() {
        let list = TickerList::parse_csv("msft, aapl,MSFT,, googl").unwrap();
        let syms: Vec<&str> = list.iter().map(|t| t.as_str()).collect();
        assert_eq!(syms, vec!["MSFT", "AAPL", "GOOGL"]);
    }

    #[test]
    fn csv_list_requires_at_least_one() {
        assert_eq!(TickerList::parse_csv(" , ,"), Err(TickerError::NoTickers));
    }

    #[test]
    fn file_lines_strip_comments() {
        let content = "# watchlist\nAAPL\n\n  msft  # software\n#TSLA\nNVDA#chips\n";
        let list = TickerList::parse_lines(content).unwrap();
        assert_eq!(list.joined(), "AAPL, MSFT, NVDA");
    }

    #[test]
    fn comment_only_file_is_empty() {
        let list = TickerList::parse_lines("# nothing yet\n\n").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TickerList::from_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, TickerError::Io { .. }));
    }
}
