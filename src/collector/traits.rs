//! Abstraction over where raw statistics come from.
//!
//! The `StatsSource` trait lets the collector run against the real `ccache`
//! binary in production and against canned output in tests.

use super::command::CollectError;
use super::parser::RawStats;

/// Source of raw ccache statistics for one collection cycle.
pub trait StatsSource: Send + Sync {
    /// Fetches and parses one set of statistics.
    ///
    /// Lines that fail to parse are skipped by the implementation. Any
    /// failure that invalidates the whole cycle is returned as an error.
    fn fetch_stats(&self) -> Result<RawStats, CollectError>;
}
