//! Mock stats source for testing.
//!
//! This module provides `MockSource` and pre-built scenarios for testing
//! the collector without a ccache binary on the machine.

mod scenarios;
mod source;

pub use source::{MockFailure, MockSource};
