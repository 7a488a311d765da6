//! Chart rendering: candlestick and technical-analysis pages per ticker.

pub mod html;
pub mod sma;

pub use html::PlotlyHtmlRenderer;

use crate::domain::{Bar, Interval, Ticker};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no bars to chart")]
    NoData,

    #[error("failed to serialize chart: {0}")]
    Serialize(String),
}

/// The two charts written for every successful ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// Price candles with the volume pane.
    Candlestick,
    /// Candles plus simple moving averages.
    Technical,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::Candlestick, ChartKind::Technical];

    /// File-name suffix, e.g. `AAPL_candlestick.html`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Candlestick => "candlestick",
            ChartKind::Technical => "technical",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub include_volume: bool,
    /// Moving-average windows drawn on the technical chart.
    pub ma_periods: Vec<usize>,
    /// Figure height in pixels.
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            include_volume: true,
            ma_periods: vec![20, 50, 200],
            height: 800,
        }
    }
}

/// Turns a bar series into a self-contained chart document.
pub trait ChartRenderer: Send + Sync {
    fn render(
        &self,
        kind: ChartKind,
        bars: &[Bar],
        ticker: &Ticker,
        interval: Interval,
    ) -> Result<String, ChartError>;
}
