//! ccachemond - ccache statistics collector daemon.
//!
//! Runs `ccache --print-stats` on a fixed interval and writes each metric
//! set to stdout, as JSON lines or as human-readable chart lines. Logs go
//! to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ccachemon::charts::{CHARTS, MODULE_NAME};
use ccachemon::collector::{Collector, CommandSource, MetricSet};
use ccachemon::config::{CollectorConfig, DEFAULT_BINARY, MAX_TIMEOUT};
use ccachemon::fmt::format_chart;

/// Output format for collected metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One JSON object per line.
    Json,
    /// One line per chart.
    Text,
}

/// ccache statistics collector daemon.
#[derive(Parser)]
#[command(name = "ccachemond", about = "ccache statistics collector daemon", version)]
struct Args {
    /// Collection interval in seconds.
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Maximum time in seconds a single `ccache --print-stats` run may take.
    #[arg(short, long, default_value = "2", value_parser = parse_timeout)]
    timeout: Duration,

    /// Path to the ccache binary.
    #[arg(long, default_value = DEFAULT_BINARY)]
    ccache: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Collect once and exit. Exit status is 1 if no data was produced.
    #[arg(long, conflicts_with = "check")]
    once: bool,

    /// Run the health check and exit. Exit status is 1 if unhealthy.
    #[arg(long)]
    check: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Parses a timeout in seconds; fractions are allowed ("0.5"). Values above
/// `MAX_TIMEOUT` are rejected.
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid timeout '{}': {}", s, e))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("timeout must be positive, got '{}'", s));
    }
    if secs > MAX_TIMEOUT.as_secs_f64() {
        return Err(format!(
            "timeout must be at most {} seconds, got '{}'",
            MAX_TIMEOUT.as_secs(),
            s
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid timeout '{}': {}", s, e))
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["ccachemond", "ccachemon"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// One JSON output record.
#[derive(Serialize)]
struct Sample<'a> {
    timestamp: i64,
    module: &'a str,
    metrics: &'a MetricSet,
}

/// Renders a metric set in the requested format.
fn render(metrics: &MetricSet, format: Format, timestamp: i64) -> Result<String, serde_json::Error> {
    match format {
        Format::Json => serde_json::to_string(&Sample {
            timestamp,
            module: MODULE_NAME,
            metrics,
        }),
        Format::Text => {
            let mut lines = Vec::with_capacity(CHARTS.len());
            for chart in &CHARTS {
                lines.push(format_chart(chart, metrics));
            }
            Ok(lines.join("\n"))
        }
    }
}

/// Writes one rendered sample to stdout.
fn emit(metrics: &MetricSet, format: Format) -> io::Result<()> {
    let rendered = render(metrics, format, Utc::now().timestamp()).map_err(io::Error::other)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", rendered)?;
    stdout.flush()
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let config = CollectorConfig::new(args.timeout).with_binary(&args.ccache);
    let mut collector: Collector<CommandSource> = Collector::from_config(&config);

    debug!(
        "Config: interval={}s, timeout={:?}, ccache={}",
        args.interval,
        config.timeout,
        config.binary.display()
    );

    if !collector.init() {
        error!("Collector failed to initialize");
        return ExitCode::FAILURE;
    }

    if args.check {
        let healthy = collector.check();
        collector.cleanup();
        if healthy {
            info!("ccache collector is healthy");
            return ExitCode::SUCCESS;
        }
        error!("ccache collector check failed");
        return ExitCode::FAILURE;
    }

    if args.once {
        let code = match collector.collect() {
            Some(metrics) => match emit(&metrics, args.format) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Failed to write metrics: {}", e);
                    ExitCode::FAILURE
                }
            },
            None => ExitCode::FAILURE,
        };
        collector.cleanup();
        return code;
    }

    info!("ccachemond {} starting", env!("CARGO_PKG_VERSION"));

    let interval = Duration::from_secs(args.interval);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let mut sample_count: u64 = 0;
    let mut failed_count: u64 = 0;

    info!("Starting collection loop");

    while running.load(Ordering::SeqCst) {
        match collector.collect() {
            Some(metrics) => {
                sample_count += 1;
                if let Err(e) = emit(&metrics, args.format) {
                    // Broken stdout means nobody is listening any more.
                    error!("Failed to write metrics: {}", e);
                    break;
                }
                debug!(
                    "Sample #{}: collected in {:?}",
                    sample_count,
                    collector.last_duration().unwrap_or_default()
                );
            }
            None => {
                failed_count += 1;
                debug!("No data this cycle ({} failed so far)", failed_count);
            }
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval.saturating_sub(collector.last_duration().unwrap_or_default());
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutting down...");
    collector.cleanup();
    info!(
        "Shutdown complete: {} samples, {} failed cycles",
        sample_count, failed_count
    );

    ExitCode::SUCCESS
}
