//! Domain types: tickers, intervals, bars.

pub mod bar;
pub mod interval;
pub mod ticker;

pub use bar::Bar;
pub use interval::Interval;
pub use ticker::{Ticker, TickerError, TickerList};
