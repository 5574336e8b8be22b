// logtrawl - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; all errors keep their causal chain
// for diagnostic logging.
//
// Per-line grammar mismatches are NOT errors (the parser returns None);
// the types below cover genuine operation failures: invalid user regexes,
// unreadable boundary lines during prescan, and I/O failures with path
// context.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all logtrawl operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogTrawlError {
    /// Filter criteria update failed.
    Filter(FilterError),

    /// Series extraction failed.
    Series(SeriesError),

    /// Time-window prescan could not establish a boundary timestamp.
    Prescan(PrescanError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LogTrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Series(e) => write!(f, "Series error: {e}"),
            Self::Prescan(e) => write!(f, "Prescan error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LogTrawlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filter(e) => Some(e),
            Self::Series(e) => Some(e),
            Self::Prescan(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter criteria updates.
#[derive(Debug)]
pub enum FilterError {
    /// User-provided search regex is invalid. The update carrying it is
    /// not installed; the previous visible list is retained unchanged.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid search regex '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
        }
    }
}

impl From<FilterError> for LogTrawlError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Series errors
// ---------------------------------------------------------------------------

/// Errors related to time-series extraction.
#[derive(Debug)]
pub enum SeriesError {
    /// User-provided extraction pattern is invalid.
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for SeriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern, source } => {
                write!(f, "Invalid series pattern '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for SeriesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPattern { source, .. } => Some(source),
        }
    }
}

impl From<SeriesError> for LogTrawlError {
    fn from(e: SeriesError) -> Self {
        Self::Series(e)
    }
}

// ---------------------------------------------------------------------------
// Prescan errors
// ---------------------------------------------------------------------------

/// Errors hit while reading a file's boundary lines for the time-window
/// prescan. These are always handled fail-closed (the file is excluded
/// from the load pass) and logged; they never abort a batch load.
#[derive(Debug)]
pub enum PrescanError {
    /// I/O error reading the file.
    Io { path: PathBuf, source: io::Error },

    /// The scanned region contained no line matching the log grammar.
    NoParseableLine { path: PathBuf },
}

impl fmt::Display for PrescanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
            Self::NoParseableLine { path } => {
                write!(f, "'{}': no parseable boundary line", path.display())
            }
        }
    }
}

impl std::error::Error for PrescanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NoParseableLine { .. } => None,
        }
    }
}

impl From<PrescanError> for LogTrawlError {
    fn from(e: PrescanError) -> Self {
        Self::Prescan(e)
    }
}

/// Convenience type alias for logtrawl results.
pub type Result<T> = std::result::Result<T, LogTrawlError>;
