//! Runs `ccache --print-stats` as a subprocess.
//!
//! The child's stdout is parsed on a reader thread while the calling thread
//! waits for exit with a deadline. On every path the child is reaped, and
//! on timeout it is killed first. On unix the child leads its own process
//! group so that anything it forked is killed with it, which lets the
//! reader see EOF and be joined before the cycle returns.

use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::parser::{RawStats, read_stats};
use super::traits::StatsSource;
use crate::config::CollectorConfig;

/// Argument that makes ccache print machine-readable statistics.
pub const PRINT_STATS_ARG: &str = "--print-stats";

/// How often the child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long the reader may take to hit EOF once the process group is killed.
const READER_GRACE: Duration = Duration::from_millis(500);

type ReaderResult = io::Result<RawStats>;

/// Error type for a failed collection cycle.
#[derive(Debug)]
pub enum CollectError {
    /// The process could not be started.
    Spawn(io::Error),
    /// Reading the process output failed.
    Stream(io::Error),
    /// Waiting for the process failed.
    Wait(io::Error),
    /// The process exited unsuccessfully.
    Exit(ExitStatus),
    /// The process did not finish in time and was killed.
    Timeout(Duration),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Spawn(e) => write!(f, "failed to start ccache: {}", e),
            CollectError::Stream(e) => write!(f, "failed to read ccache output: {}", e),
            CollectError::Wait(e) => write!(f, "failed to wait for ccache: {}", e),
            CollectError::Exit(status) => write!(f, "ccache exited unsuccessfully: {}", status),
            CollectError::Timeout(t) => write!(f, "ccache did not finish within {:?}", t),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Spawn(e) | CollectError::Stream(e) | CollectError::Wait(e) => Some(e),
            CollectError::Exit(_) | CollectError::Timeout(_) => None,
        }
    }
}

/// Stats source backed by the real ccache binary.
#[derive(Debug, Clone)]
pub struct CommandSource {
    binary: PathBuf,
    timeout: Duration,
}

impl CommandSource {
    /// Creates a source that runs `binary --print-stats`.
    ///
    /// # Arguments
    /// * `binary` - Path or `PATH`-resolved name of the ccache binary
    /// * `timeout` - Upper bound for the whole run
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(config.binary.clone(), config.timeout)
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl StatsSource for CommandSource {
    fn fetch_stats(&self) -> Result<RawStats, CollectError> {
        // A timeout too large to represent as an instant means no deadline.
        let deadline = Instant::now().checked_add(self.timeout);

        let mut command = Command::new(&self.binary);
        command
            .arg(PRINT_STATS_ARG)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(CollectError::Spawn)?;
        trace!(pid = child.id(), binary = %self.binary.display(), "spawned ccache");

        let Some(stdout) = child.stdout.take() else {
            kill_and_reap(&mut child);
            return Err(CollectError::Spawn(io::Error::other("stdout was not captured")));
        };

        let (tx, rx) = mpsc::channel();
        let reader = thread::Builder::new()
            .name("ccache-stdout".to_string())
            .spawn(move || {
                // The receiver may be gone if the reader was abandoned.
                let _ = tx.send(read_stats(BufReader::new(stdout)));
            });
        let reader = match reader {
            Ok(handle) => handle,
            Err(e) => {
                kill_and_reap(&mut child);
                return Err(CollectError::Spawn(e));
            }
        };

        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                debug!(timeout = ?self.timeout, "ccache timed out, killing");
                kill_and_reap(&mut child);
                finish_reader(reader, &rx);
                return Err(CollectError::Timeout(self.timeout));
            }
            Err(e) => {
                kill_and_reap(&mut child);
                finish_reader(reader, &rx);
                return Err(CollectError::Wait(e));
            }
        };

        // A background process forked by the tool can hold the pipe open
        // after the tool itself has exited, so the deadline still applies.
        let received = match deadline {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        let result = match received {
            Ok(result) => {
                join_reader(reader);
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                debug!(timeout = ?self.timeout, "ccache output still open after exit");
                kill_group(&child);
                finish_reader(reader, &rx);
                return Err(CollectError::Timeout(self.timeout));
            }
            Err(RecvTimeoutError::Disconnected) => {
                join_reader(reader);
                return Err(CollectError::Stream(io::Error::other(
                    "output reader stopped without a result",
                )));
            }
        };
        let stats = result.map_err(CollectError::Stream)?;

        if !status.success() {
            return Err(CollectError::Exit(status));
        }

        debug!(keys = stats.len(), "parsed ccache stats");
        Ok(stats)
    }
}

/// Polls the child until it exits or the deadline passes.
///
/// Returns `Ok(None)` on deadline. A `None` deadline waits indefinitely.
fn wait_until(child: &mut Child, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let mut sleep = POLL_INTERVAL;
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            sleep = sleep.min(deadline - now);
        }
        thread::sleep(sleep);
    }
}

/// Kills the child's whole process group.
///
/// The group outlives the child as long as any member is alive, so this
/// also works after the child itself has been reaped.
#[cfg(unix)]
fn kill_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group id is the child's pid
    // because it was spawned with `process_group(0)`.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        debug!(error = %io::Error::last_os_error(), "killpg failed, group likely gone");
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

/// Waits for the reader to hit EOF, then joins it.
///
/// Only meant for after the process group was killed. If something outside
/// the group still holds the pipe, the reader is left behind.
fn finish_reader(reader: JoinHandle<()>, rx: &Receiver<ReaderResult>) {
    match rx.recv_timeout(READER_GRACE) {
        Ok(_) | Err(RecvTimeoutError::Disconnected) => join_reader(reader),
        Err(RecvTimeoutError::Timeout) => {
            warn!("ccache output still open after kill, abandoning reader");
        }
    }
}

fn join_reader(reader: JoinHandle<()>) {
    if reader.join().is_err() {
        warn!("ccache output reader panicked");
    }
}

fn kill_and_reap(child: &mut Child) {
    kill_group(child);
    if let Err(e) = child.kill() {
        debug!(error = %e, "kill failed, process likely exited already");
    }
    if let Err(e) = child.wait() {
        warn!(error = %e, "failed to reap ccache process");
    }
}
