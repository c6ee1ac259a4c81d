//! Chart definitions for the published metrics.
//!
//! Each chart groups one or more metric ids (dimensions). A dimension's
//! `div` tells the renderer how to scale the raw integer back to a real
//! value, which is how the fixed-point percentages are displayed.

use serde::Serialize;

use crate::collector::{MetricSet, PRECISION};

/// Module name reported to the host.
pub const MODULE_NAME: &str = "ccache";

/// Base priority; charts follow it in declaration order.
pub const PRIORITY: u32 = 69696;

/// How a chart stacks its dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Stacked,
}

/// One series within a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dim {
    /// Metric name in the `MetricSet`.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Divisor applied for display.
    pub div: i64,
}

impl Dim {
    const fn new(id: &'static str, name: &'static str) -> Self {
        Self { id, name, div: 1 }
    }

    const fn scaled(id: &'static str, name: &'static str, div: i64) -> Self {
        Self { id, name, div }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chart {
    pub id: &'static str,
    pub title: &'static str,
    pub units: &'static str,
    pub family: &'static str,
    pub context: &'static str,
    pub priority: u32,
    pub chart_type: ChartType,
    pub dims: &'static [Dim],
}

/// All charts, in display order.
pub static CHARTS: [Chart; 4] = [
    Chart {
        id: "local_storage",
        title: "Local Storage Hits/Misses",
        units: "count",
        family: MODULE_NAME,
        context: "ccache.local_storage",
        priority: PRIORITY + 1,
        chart_type: ChartType::Stacked,
        dims: &[
            Dim::new("local_storage_hit", "hits"),
            Dim::new("local_storage_miss", "misses"),
        ],
    },
    Chart {
        id: "local_storage_percentage",
        title: "Local Storage Hits/Misses Percentage",
        units: "percentage",
        family: MODULE_NAME,
        context: "ccache.local_storage_percentage",
        priority: PRIORITY + 2,
        chart_type: ChartType::Stacked,
        dims: &[
            Dim::scaled("local_storage_hit_percentage", "hit", PRECISION),
            Dim::scaled("local_storage_miss_percentage", "miss", PRECISION),
        ],
    },
    Chart {
        id: "cache_size",
        title: "Cache size",
        units: "bytes",
        family: MODULE_NAME,
        context: "ccache.cache_size",
        priority: PRIORITY + 3,
        chart_type: ChartType::Line,
        dims: &[Dim::new("cache_size", "size")],
    },
    Chart {
        id: "files_incache",
        title: "Files in cache",
        units: "count",
        family: MODULE_NAME,
        context: "ccache.files_in_cache",
        priority: PRIORITY + 4,
        chart_type: ChartType::Line,
        dims: &[Dim::new("files_in_cache", "files")],
    },
];

/// Values of one chart's dimensions, paired with their definitions.
///
/// Dimensions whose id is not in the metric set are skipped.
pub fn chart_values(chart: &Chart, metrics: &MetricSet) -> Vec<(Dim, i64)> {
    chart
        .dims
        .iter()
        .filter_map(|dim| metrics.get(dim.id).map(|v| (*dim, v)))
        .collect()
}
