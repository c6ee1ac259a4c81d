//! Pre-built mock scenarios for testing.
//!
//! Output samples follow what `ccache --print-stats` prints on 4.x: tab
//! separated counters, one per line.

use super::source::MockSource;

impl MockSource {
    /// A warm cache: 120 hits, 30 misses, 2 MiB in 500 files.
    pub fn typical_cache() -> Self {
        Self::with_output(
            "\
stats_updated_timestamp\t1700000000
stats_zeroed_timestamp\t0
autoconf_test\t0
bad_compiler_arguments\t2
cache_miss\t30
cleanups_performed\t0
compiler_check_failed\t0
direct_cache_hit\t100
direct_cache_miss\t50
files_in_cache\t500
cache_size_kibibyte\t2048
local_storage_hit\t120
local_storage_miss\t30
local_storage_read_hit\t240
local_storage_read_miss\t60
preprocessed_cache_hit\t20
remote_storage_hit\t0
remote_storage_miss\t0
",
        )
    }

    /// A freshly created cache with no lookups yet.
    pub fn empty_cache() -> Self {
        Self::with_output(
            "\
stats_updated_timestamp\t0
local_storage_hit\t0
local_storage_miss\t0
cache_size_kibibyte\t0
files_in_cache\t0
",
        )
    }

    /// The typical cache with junk lines interleaved.
    pub fn noisy_cache() -> Self {
        Self::with_output(
            "\
ccache statistics report
local_storage_hit 120
garbage_field not_a_number
local_storage_miss    30

cache_size_kibibyte 2048 KiB
cache_size_kibibyte 2048
files_in_cache 500
",
        )
    }

    /// An old ccache that only knows the human-readable summary.
    pub fn legacy_output() -> Self {
        Self::with_output(
            "\
cache directory                     /home/user/.ccache
primary config                      /home/user/.ccache/ccache.conf
cache hit (direct)                    100
cache miss                             30
files in cache                        500
",
        )
    }
}
