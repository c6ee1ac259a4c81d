//! ccache statistics collector.
//!
//! One collection cycle runs `ccache --print-stats`, parses its key/value
//! lines and derives a fixed set of six metrics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Collector                   │
//! │   init / check / collect / cleanup           │
//! │                     │                        │
//! │          ┌──────────▼──────────┐             │
//! │          │ StatsSource (trait) │             │
//! │          └──────────┬──────────┘             │
//! │                     │ RawStats               │
//! │          ┌──────────▼──────────┐             │
//! │          │ MetricSet::from_raw │             │
//! │          └─────────────────────┘             │
//! └──────────────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!   ┌──────▼────────┐         ┌──────▼──────┐
//!   │ CommandSource │         │ MockSource  │
//!   │ (ccache)      │         │ (Testing)   │
//!   └───────────────┘         └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use ccachemon::collector::Collector;
//! use ccachemon::config::CollectorConfig;
//!
//! let mut collector = Collector::from_config(&CollectorConfig::default());
//! if let Some(metrics) = collector.collect() {
//!     println!("{} files", metrics.files_in_cache);
//! }
//! ```
//!
//! ## Testing (with MockSource)
//!
//! ```
//! use ccachemon::collector::{Collector, MockSource, PRECISION};
//!
//! let mut collector = Collector::new(MockSource::typical_cache(), PRECISION);
//! let metrics = collector.collect().unwrap();
//! assert_eq!(metrics.local_storage_hit_percentage, 80_000);
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod command;
pub mod metrics;
pub mod mock;
pub mod parser;
pub mod traits;

pub use collector::Collector;
pub use command::{CollectError, CommandSource};
pub use metrics::{MetricSet, PRECISION};
pub use mock::MockSource;
pub use parser::{ParseError, RawStats};
pub use traits::StatsSource;
