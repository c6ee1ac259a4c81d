//! ccachemon - ccache statistics collector library.
//!
//! Provides:
//! - `collector` — runs `ccache --print-stats` and derives the metric set
//! - `charts` — chart and dimension definitions for the published metrics
//! - `config` — collector settings
//! - `fmt` — text rendering helpers
//!
//! The `ccachemond` binary drives the collector on a fixed interval.

pub mod charts;
pub mod collector;
pub mod config;
pub mod fmt;
