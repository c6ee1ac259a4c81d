//! Collector configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default upper bound for one `ccache --print-stats` run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest timeout accepted from the command line.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default binary name, resolved through `PATH`.
pub const DEFAULT_BINARY: &str = "ccache";

/// Settings for one collector instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Path or name of the ccache binary.
    pub binary: PathBuf,
    /// Maximum time a collection cycle may spend on the subprocess.
    pub timeout: Duration,
}

impl CollectorConfig {
    /// Creates a config with the given timeout and the default binary.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Overrides the ccache binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
