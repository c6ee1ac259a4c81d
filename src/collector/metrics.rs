//! Normalized metric set derived from raw ccache statistics.

use serde::Serialize;
use tracing::debug;

use super::parser::RawStats;

/// Fixed-point scale for percentages: `80000` means `80.000%`.
pub const PRECISION: i64 = 1000;

/// Bytes per kibibyte, for `cache_size_kibibyte`.
const KIB: i64 = 1024;

/// Raw keys the metric set is derived from.
pub const KEY_LOCAL_STORAGE_HIT: &str = "local_storage_hit";
pub const KEY_LOCAL_STORAGE_MISS: &str = "local_storage_miss";
pub const KEY_CACHE_SIZE_KIB: &str = "cache_size_kibibyte";
pub const KEY_FILES_IN_CACHE: &str = "files_in_cache";

const EXPECTED_KEYS: [&str; 4] = [
    KEY_LOCAL_STORAGE_HIT,
    KEY_LOCAL_STORAGE_MISS,
    KEY_CACHE_SIZE_KIB,
    KEY_FILES_IN_CACHE,
];

/// One complete collection result.
///
/// Serializes to a flat object with exactly six keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricSet {
    pub local_storage_hit: i64,
    pub local_storage_miss: i64,
    /// Hit ratio scaled by `100 * precision`.
    pub local_storage_hit_percentage: i64,
    /// Miss ratio scaled by `100 * precision`.
    pub local_storage_miss_percentage: i64,
    /// Cache size in bytes.
    pub cache_size: i64,
    pub files_in_cache: i64,
}

impl MetricSet {
    /// Number of published metrics.
    pub const LEN: usize = 6;

    /// Derives the metric set from raw stats.
    ///
    /// Missing keys count as zero. Percentages use `precision` as the
    /// fixed-point scale and are both zero when there were no lookups.
    pub fn from_raw(stats: &RawStats, precision: i64) -> Self {
        let get = |key: &str| stats.get(key).copied().unwrap_or(0);

        let missing: Vec<&str> = EXPECTED_KEYS
            .iter()
            .copied()
            .filter(|k| !stats.contains_key(*k))
            .collect();
        if !missing.is_empty() {
            debug!(?missing, "stats output lacks expected keys, using 0");
        }

        let hit = get(KEY_LOCAL_STORAGE_HIT);
        let miss = get(KEY_LOCAL_STORAGE_MISS);
        let total = hit.saturating_add(miss);

        Self {
            local_storage_hit: hit,
            local_storage_miss: miss,
            local_storage_hit_percentage: percentage(hit, total, precision),
            local_storage_miss_percentage: percentage(miss, total, precision),
            cache_size: get(KEY_CACHE_SIZE_KIB).saturating_mul(KIB),
            files_in_cache: get(KEY_FILES_IN_CACHE),
        }
    }

    /// Returns `(name, value)` pairs in publication order.
    pub fn entries(&self) -> [(&'static str, i64); Self::LEN] {
        [
            ("local_storage_hit", self.local_storage_hit),
            ("local_storage_miss", self.local_storage_miss),
            (
                "local_storage_hit_percentage",
                self.local_storage_hit_percentage,
            ),
            (
                "local_storage_miss_percentage",
                self.local_storage_miss_percentage,
            ),
            ("cache_size", self.cache_size),
            ("files_in_cache", self.files_in_cache),
        ]
    }

    /// Looks up a metric by its published name.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// Computes `part / total` as a percentage scaled by `precision`.
///
/// Integer division truncates toward zero. A non-positive `total` yields 0.
pub fn percentage(part: i64, total: i64, precision: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    // i128 keeps `precision * 100 * part` exact for any i64 input.
    let scaled = precision as i128 * 100 * part as i128 / total as i128;
    scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
