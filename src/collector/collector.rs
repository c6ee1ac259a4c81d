//! Collector that turns one ccache stats run into a `MetricSet`.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::collector::command::{CollectError, CommandSource};
use crate::collector::metrics::{MetricSet, PRECISION};
use crate::collector::traits::StatsSource;
use crate::config::CollectorConfig;

/// Runs collection cycles against a stats source.
///
/// Each cycle is independent: nothing is carried over between calls except
/// the duration of the last one, kept for logging.
pub struct Collector<S: StatsSource> {
    source: S,
    precision: i64,
    last_duration: Option<Duration>,
}

impl Collector<CommandSource> {
    /// Creates a collector that runs the configured ccache binary.
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(CommandSource::from_config(config), PRECISION)
    }
}

impl<S: StatsSource> Collector<S> {
    /// Creates a new collector.
    ///
    /// # Arguments
    /// * `source` - Where raw stats come from (real binary or mock)
    /// * `precision` - Fixed-point scale for percentages
    pub fn new(source: S, precision: i64) -> Self {
        Self {
            source,
            precision,
            last_duration: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn precision(&self) -> i64 {
        self.precision
    }

    /// Wall time of the last cycle, successful or not.
    pub fn last_duration(&self) -> Option<Duration> {
        self.last_duration
    }

    /// Prepares the collector. Nothing to set up, always ready.
    pub fn init(&mut self) -> bool {
        true
    }

    /// Healthy iff one cycle produces data.
    pub fn check(&mut self) -> bool {
        self.collect().is_some()
    }

    /// Runs one cycle, reporting failures as `None`.
    pub fn collect(&mut self) -> Option<MetricSet> {
        match self.try_collect() {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(error = %e, "ccache collection failed");
                None
            }
        }
    }

    /// Runs one cycle and returns the failure reason on error.
    pub fn try_collect(&mut self) -> Result<MetricSet, CollectError> {
        let start = Instant::now();
        let result = self
            .source
            .fetch_stats()
            .map(|stats| MetricSet::from_raw(&stats, self.precision));
        let elapsed = start.elapsed();
        self.last_duration = Some(elapsed);
        debug!(elapsed = ?elapsed, ok = result.is_ok(), "collection cycle finished");
        result
    }

    /// Releases resources. The collector holds none between cycles.
    pub fn cleanup(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFailure, MockSource};

    fn expected_typical() -> MetricSet {
        MetricSet {
            local_storage_hit: 120,
            local_storage_miss: 30,
            local_storage_hit_percentage: 80_000,
            local_storage_miss_percentage: 20_000,
            cache_size: 2_097_152,
            files_in_cache: 500,
        }
    }

    #[test]
    fn test_collect_typical() {
        let mut collector = Collector::new(MockSource::typical_cache(), PRECISION);
        assert_eq!(collector.collect(), Some(expected_typical()));
        assert!(collector.last_duration().is_some());
    }

    #[test]
    fn test_collect_ignores_garbage_lines() {
        let mut collector = Collector::new(MockSource::noisy_cache(), PRECISION);
        assert_eq!(collector.collect(), Some(expected_typical()));
    }

    #[test]
    fn test_collect_empty_cache() {
        let mut collector = Collector::new(MockSource::empty_cache(), PRECISION);
        let metrics = collector.collect().unwrap();
        assert_eq!(metrics, MetricSet::default());
        assert_eq!(metrics.local_storage_hit_percentage, 0);
        assert_eq!(metrics.local_storage_miss_percentage, 0);
    }

    #[test]
    fn test_collect_failures_give_no_data() {
        for failure in [
            MockFailure::NotFound,
            MockFailure::BrokenPipe,
            MockFailure::ExitCode(1),
            MockFailure::Timeout,
        ] {
            let mut collector = Collector::new(MockSource::failing(failure), PRECISION);
            assert_eq!(collector.collect(), None, "{:?}", failure);
            assert!(!collector.check());
        }
    }

    #[test]
    fn test_try_collect_reports_reason() {
        let mut collector = Collector::new(MockSource::failing(MockFailure::Timeout), PRECISION);
        assert!(matches!(
            collector.try_collect(),
            Err(CollectError::Timeout(_))
        ));
    }

    #[test]
    fn test_lifecycle_hooks() {
        let mut collector = Collector::new(MockSource::typical_cache(), PRECISION);
        assert!(collector.init());
        assert!(collector.check());
        collector.cleanup();
        // init does not touch the source; check runs exactly one cycle.
        assert_eq!(collector.source().calls(), 1);
    }

    #[test]
    fn test_custom_precision() {
        let mut collector = Collector::new(MockSource::typical_cache(), 1);
        let metrics = collector.collect().unwrap();
        assert_eq!(metrics.local_storage_hit_percentage, 80);
        assert_eq!(metrics.local_storage_miss_percentage, 20);
    }

    #[test]
    fn test_each_cycle_runs_source_again() {
        let mut collector = Collector::new(MockSource::typical_cache(), PRECISION);
        collector.collect();
        collector.collect();
        assert_eq!(collector.source().calls(), 2);
    }

    #[cfg(unix)]
    mod with_process {
        use super::*;
        use crate::collector::command::test_support::{TYPICAL_OUTPUT, fake_ccache};

        fn collector_for(path: &std::path::Path) -> Collector<CommandSource> {
            Collector::from_config(
                &CollectorConfig::new(Duration::from_secs(5)).with_binary(path),
            )
        }

        #[test]
        fn test_end_to_end_success() {
            let fake = fake_ccache(TYPICAL_OUTPUT);
            assert_eq!(collector_for(&fake.path).collect(), Some(expected_typical()));
        }

        #[test]
        fn test_end_to_end_garbage_line() {
            let fake = fake_ccache(
                "echo 'local_storage_hit 120'\n\
                 echo 'garbage_field not_a_number'\n\
                 echo 'local_storage_miss 30'\n\
                 echo 'cache_size_kibibyte 2048'\n\
                 echo 'files_in_cache 500'",
            );
            assert_eq!(collector_for(&fake.path).collect(), Some(expected_typical()));
        }

        #[test]
        fn test_end_to_end_zero_lookups() {
            let fake = fake_ccache(
                "printf 'local_storage_hit 0\\nlocal_storage_miss 0\\ncache_size_kibibyte 1\\nfiles_in_cache 0\\n'",
            );
            let metrics = collector_for(&fake.path).collect().unwrap();
            assert_eq!(metrics.local_storage_hit_percentage, 0);
            assert_eq!(metrics.local_storage_miss_percentage, 0);
            assert_eq!(metrics.cache_size, 1024);
        }

        #[test]
        fn test_end_to_end_nonzero_exit() {
            let fake = fake_ccache(&format!("{}\nexit 1", TYPICAL_OUTPUT));
            let mut collector = collector_for(&fake.path);
            assert_eq!(collector.collect(), None);
            assert!(!collector.check());
        }
    }
}
