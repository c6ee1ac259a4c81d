//! In-memory stats source that replays canned `--print-stats` output.

use std::io::{self, Cursor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::collector::command::CollectError;
use crate::collector::parser::{RawStats, read_stats};
use crate::collector::traits::StatsSource;

/// Failure a `MockSource` should report instead of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Binary not found.
    NotFound,
    /// Output stream broke mid-read.
    BrokenPipe,
    /// Process exited with the given code (unix only).
    ExitCode(i32),
    /// Process did not finish in time.
    Timeout,
}

/// Replays fixed output, or a fixed failure, on every fetch.
#[derive(Debug, Default)]
pub struct MockSource {
    output: String,
    failure: Option<MockFailure>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Creates a source with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that returns `output` as if printed by ccache.
    pub fn with_output(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    /// Creates a source that always fails.
    pub fn failing(failure: MockFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    /// Number of times `fetch_stats` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn error(failure: MockFailure) -> CollectError {
        match failure {
            MockFailure::NotFound => CollectError::Spawn(io::Error::new(
                io::ErrorKind::NotFound,
                "No such file or directory",
            )),
            MockFailure::BrokenPipe => CollectError::Stream(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "broken pipe",
            )),
            MockFailure::ExitCode(code) => exit_error(code),
            MockFailure::Timeout => CollectError::Timeout(Duration::from_secs(2)),
        }
    }
}

#[cfg(unix)]
fn exit_error(code: i32) -> CollectError {
    use std::os::unix::process::ExitStatusExt;
    // Raw wait status stores the exit code in the second byte.
    CollectError::Exit(std::process::ExitStatus::from_raw((code & 0xff) << 8))
}

#[cfg(windows)]
fn exit_error(code: i32) -> CollectError {
    use std::os::windows::process::ExitStatusExt;
    CollectError::Exit(std::process::ExitStatus::from_raw(code as u32))
}

impl StatsSource for MockSource {
    fn fetch_stats(&self) -> Result<RawStats, CollectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.failure {
            return Err(Self::error(failure));
        }
        read_stats(Cursor::new(self.output.as_bytes())).map_err(CollectError::Stream)
    }
}
