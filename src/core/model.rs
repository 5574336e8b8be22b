// logtrawl - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no UI.
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

// =============================================================================
// Log Entry (output of parsing)
// =============================================================================

/// A single structured record parsed from one log line.
///
/// Created only during a load pass, never mutated, and replaced wholesale
/// when the next completed load installs a new entry set. An entry exists
/// only if its source line matched the full line grammar; non-matching
/// lines (multi-line continuations, stack traces) produce no entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// 1-based line number, scoped to the source file. Not globally unique
    /// when entries from multiple files are concatenated.
    pub line_number: u64,

    /// The fixed 8-character type field, trimmed of surrounding whitespace.
    /// Empty after trimming is legal (an unlabeled type).
    pub log_type: String,

    /// Timestamp to microsecond precision. The grammar carries no timezone,
    /// so this is a naive local timestamp.
    pub timestamp: NaiveDateTime,

    /// Remainder of the line after the second field delimiter, verbatim.
    pub message: String,

    /// Path to the source log file.
    pub source_file: PathBuf,
}

impl LogEntry {
    /// The four logical display fields for one table row: line number,
    /// type, timestamp at millisecond precision, message.
    pub fn display_fields(&self) -> [String; 4] {
        [
            self.line_number.to_string(),
            self.log_type.clone(),
            self.timestamp
                .format(constants::TIMESTAMP_DISPLAY_FORMAT)
                .to_string(),
            self.message.clone(),
        ]
    }
}

// =============================================================================
// Time window
// =============================================================================

/// Optional [start, end] timestamp bounds for a load pass.
///
/// Both bounds are inclusive: an entry is kept unless its timestamp is
/// strictly before `start` or strictly after `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl TimeWindow {
    /// A window with no bounds (every entry passes; prescan is skipped).
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns true when neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Exact per-entry containment check. This is the authoritative filter;
    /// the file-level prescan only decides which files are read at all.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        if let Some(start) = self.start {
            if ts < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if ts > end {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Type registry
// =============================================================================

/// Ordered set of distinct `log_type` values, insertion order = first-seen
/// order across the full entry set. Rebuilt on every completed load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: Vec<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a type, keeping first-seen order. Duplicates are ignored.
    pub fn record(&mut self, log_type: &str) {
        if !self.types.iter().any(|t| t == log_type) {
            self.types.push(log_type.to_string());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    pub fn contains(&self, log_type: &str) -> bool {
        self.types.iter().any(|t| t == log_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// =============================================================================
// Load progress (messages from the loader thread to the owning engine)
// =============================================================================

/// Progress messages sent from the background load thread to the engine.
///
/// For a given load, `FileProcessed` percentages are non-decreasing up to
/// 100 and `Completed` is the last message.
#[derive(Debug, Clone)]
pub enum LoadProgress {
    /// A candidate file has been fully processed (parsed or skipped on
    /// read error). `percent` = round(files_processed * 100 / candidates).
    FileProcessed {
        path: PathBuf,
        files_processed: usize,
        total_candidates: usize,
        percent: u8,
    },

    /// The load pass finished. Carries the full concatenated entry set and
    /// the distinct types in first-seen order.
    Completed {
        entries: Vec<LogEntry>,
        types: TypeRegistry,
    },
}

// =============================================================================
// Severity display colors
// =============================================================================

/// RGBA display color with fixed translucency for a recognised severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Display color for the three recognised severity types.
/// Everything else is unstyled (`None`).
pub fn type_color(log_type: &str) -> Option<TypeColor> {
    match log_type {
        "ERROR" => Some(TypeColor {
            r: 255,
            g: 0,
            b: 0,
            a: 200,
        }),
        "WARN" => Some(TypeColor {
            r: 255,
            g: 125,
            b: 0,
            a: 130,
        }),
        "INFO" => Some(TypeColor {
            r: 75,
            g: 255,
            b: 0,
            a: 80,
        }),
        _ => None,
    }
}
