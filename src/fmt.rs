//! Formatting helpers for the text output of the daemon.

use crate::charts::{Chart, chart_values};
use crate::collector::MetricSet;

/// Format byte count as human-readable size.
///
/// `"1.5 GiB"`, `"100.3 MiB"`, `"50.0 KiB"`, `"512 B"`
pub fn format_bytes(bytes: i64) -> String {
    let f = bytes as f64;
    let abs = bytes.unsigned_abs();
    if abs >= 1024 * 1024 * 1024 {
        format!("{:.1} GiB", f / (1024.0 * 1024.0 * 1024.0))
    } else if abs >= 1024 * 1024 {
        format!("{:.1} MiB", f / (1024.0 * 1024.0))
    } else if abs >= 1024 {
        format!("{:.1} KiB", f / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a fixed-point value with as many decimals as `div` implies.
///
/// `format_scaled(80000, 1000)` gives `"80.000"`; a `div` of 1 or less
/// prints the integer as is.
pub fn format_scaled(value: i64, div: i64) -> String {
    if div <= 1 {
        return value.to_string();
    }
    let digits = decimal_digits(div);
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let div = div.unsigned_abs();
    format!(
        "{}{}.{:0width$}",
        sign,
        abs / div,
        abs % div,
        width = digits
    )
}

/// Number of decimal places needed to show remainders of `div`.
fn decimal_digits(div: i64) -> usize {
    let mut digits = 0;
    let mut n = div - 1;
    while n > 0 {
        digits += 1;
        n /= 10;
    }
    digits
}

/// Renders one chart as `Title: name=value name=value`.
pub fn format_chart(chart: &Chart, metrics: &MetricSet) -> String {
    let values: Vec<String> = chart_values(chart, metrics)
        .into_iter()
        .map(|(dim, value)| {
            let shown = match chart.units {
                "bytes" => format_bytes(value),
                "percentage" => format!("{}%", format_scaled(value, dim.div)),
                _ => format_scaled(value, dim.div),
            };
            format!("{}={}", dim.name, shown)
        })
        .collect();
    format!("{}: {}", chart.title, values.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::CHARTS;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(2_097_152), "2.0 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 / 2), "1.5 GiB");
        assert_eq!(format_bytes(0), "0 B");
    }

    #[test]
    fn test_format_scaled() {
        assert_eq!(format_scaled(80_000, 1000), "80.000");
        assert_eq!(format_scaled(33_333, 1000), "33.333");
        assert_eq!(format_scaled(5, 1000), "0.005");
        assert_eq!(format_scaled(-1500, 1000), "-1.500");
        assert_eq!(format_scaled(42, 1), "42");
        assert_eq!(format_scaled(7, 10), "0.7");
    }

    #[test]
    fn test_format_chart() {
        let metrics = MetricSet {
            local_storage_hit: 120,
            local_storage_miss: 30,
            local_storage_hit_percentage: 80_000,
            local_storage_miss_percentage: 20_000,
            cache_size: 2_097_152,
            files_in_cache: 500,
        };
        let lines: Vec<String> = CHARTS.iter().map(|c| format_chart(c, &metrics)).collect();
        assert_eq!(lines[0], "Local Storage Hits/Misses: hits=120 misses=30");
        assert_eq!(
            lines[1],
            "Local Storage Hits/Misses Percentage: hit=80.000% miss=20.000%"
        );
        assert_eq!(lines[2], "Cache size: size=2.0 MiB");
        assert_eq!(lines[3], "Files in cache: files=500");
    }
}
