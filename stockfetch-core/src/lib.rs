//! Stockfetch Core: range resolution, batch downloading, CSV and chart output.
//!
//! This crate holds everything except the terminal front end:
//! - Domain types (tickers, intervals, bars)
//! - Interval-aware range resolver with lookback clamping
//! - Provider trait, Yahoo Finance provider, circuit breaker, rate limiter
//! - Per-ticker fetch state machine with bounded retry and backoff
//! - Run directory layout, CSV writer, HTML charts
//! - TOML configuration

pub mod chart;
pub mod config;
pub mod data;
pub mod domain;
pub mod output;
pub mod range;
