//! Parser for `ccache --print-stats` output.
//!
//! The tool prints one statistic per line as `<key><whitespace><integer>`.
//! These are pure functions over text or a buffered reader so they can be
//! tested without spawning anything.

use std::collections::HashMap;
use std::io::{self, BufRead};

use tracing::{debug, trace};

/// Raw key/value statistics as printed by the tool.
///
/// Unknown keys are kept; only a handful are used to build a
/// [`MetricSet`](super::MetricSet).
pub type RawStats = HashMap<String, i64>;

/// Error type for a single line that could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parses a single stats line.
///
/// Returns `Ok(None)` for lines that are not exactly two whitespace-separated
/// fields (headers, blank lines, free text). Returns an error when the line
/// has the right shape but the value is not a base-10 `i64`.
pub fn parse_stats_line(line: &str) -> Result<Option<(&str, i64)>, ParseError> {
    let mut fields = line.split_whitespace();
    let (Some(key), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
        return Ok(None);
    };

    let value: i64 = value
        .parse()
        .map_err(|e| ParseError::new(format!("invalid value '{}' for {}: {}", value, key, e)))?;

    Ok(Some((key, value)))
}

/// Parses stats text that is already in memory.
///
/// Lines that do not qualify or fail to parse are skipped.
pub fn parse_stats(content: &str) -> RawStats {
    let mut stats = RawStats::new();
    for line in content.lines() {
        insert_line(&mut stats, line);
    }
    stats
}

/// Parses stats from a buffered reader until EOF.
///
/// Per-line parse failures are skipped; a read failure aborts and is
/// returned to the caller. Lines that are not valid UTF-8 are decoded lossily
/// rather than aborting the scan.
pub fn read_stats<R: BufRead>(reader: R) -> io::Result<RawStats> {
    let mut stats = RawStats::new();
    for line in reader.split(b'\n') {
        let line = line?;
        insert_line(&mut stats, &String::from_utf8_lossy(&line));
    }
    Ok(stats)
}

fn insert_line(stats: &mut RawStats, line: &str) {
    match parse_stats_line(line) {
        Ok(Some((key, value))) => {
            stats.insert(key.to_string(), value);
        }
        Ok(None) => {
            trace!(line, "skipping line that is not a key/value pair");
        }
        Err(e) => {
            debug!(error = %e, "skipping unparsable stats line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn test_parse_line_basic() {
        assert_eq!(
            parse_stats_line("local_storage_hit 120").unwrap(),
            Some(("local_storage_hit", 120))
        );
    }

    #[test]
    fn test_parse_line_extra_whitespace() {
        assert_eq!(
            parse_stats_line("  files_in_cache \t\t 500  ").unwrap(),
            Some(("files_in_cache", 500))
        );
    }

    #[test]
    fn test_parse_line_negative() {
        assert_eq!(
            parse_stats_line("odd_counter -7").unwrap(),
            Some(("odd_counter", -7))
        );
    }

    #[test]
    fn test_parse_line_wrong_field_count() {
        assert_eq!(parse_stats_line("").unwrap(), None);
        assert_eq!(parse_stats_line("lonely").unwrap(), None);
        assert_eq!(parse_stats_line("stats_updated_timestamp 1 2").unwrap(), None);
        assert_eq!(
            parse_stats_line("Cache directory   /home/user/.ccache").unwrap(),
            None
        );
    }

    #[test]
    fn test_parse_line_bad_value() {
        let err = parse_stats_line("garbage_field not_a_number").unwrap_err();
        assert!(err.message.contains("garbage_field"));
        assert!(parse_stats_line("big 99999999999999999999").is_err());
        assert!(parse_stats_line("hex 0x10").is_err());
    }

    #[test]
    fn test_parse_stats_skips_bad_lines() {
        let content = "\
local_storage_hit 120
garbage_field not_a_number
three fields here
local_storage_miss 30

files_in_cache 500
";
        let stats = parse_stats(content);
        assert_eq!(stats.len(), 3);
        assert_eq!(stats["local_storage_hit"], 120);
        assert_eq!(stats["local_storage_miss"], 30);
        assert_eq!(stats["files_in_cache"], 500);
        assert!(!stats.contains_key("garbage_field"));
    }

    #[test]
    fn test_parse_stats_keeps_unknown_keys() {
        let stats = parse_stats("direct_cache_hit 4\nlocal_storage_hit 1\n");
        assert_eq!(stats["direct_cache_hit"], 4);
    }

    #[test]
    fn test_parse_stats_last_value_wins() {
        let stats = parse_stats("files_in_cache 1\nfiles_in_cache 2\n");
        assert_eq!(stats["files_in_cache"], 2);
    }

    #[test]
    fn test_read_stats_from_reader() {
        let reader = Cursor::new("cache_size_kibibyte 2048\nfiles_in_cache 500\n");
        let stats = read_stats(reader).unwrap();
        assert_eq!(stats["cache_size_kibibyte"], 2048);
        assert_eq!(stats["files_in_cache"], 500);
    }

    /// Reader that yields some valid data and then fails.
    struct FailingReader {
        data: Cursor<&'static [u8]>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(io::Error::other("pipe broke"));
            }
            Ok(n)
        }
    }

    #[test]
    fn test_read_stats_propagates_read_error() {
        let reader = io::BufReader::new(FailingReader {
            data: Cursor::new(&b"local_storage_hit 1\n"[..]),
        });
        let err = read_stats(reader).unwrap_err();
        assert_eq!(err.to_string(), "pipe broke");
    }

    #[test]
    fn test_read_stats_tolerates_invalid_utf8() {
        let reader = Cursor::new(&b"local_storage_hit 1\n\xff\xfe oops\nfiles_in_cache 3\r\n"[..]);
        let stats = read_stats(reader).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["local_storage_hit"], 1);
        assert_eq!(stats["files_in_cache"], 3);
    }
}
