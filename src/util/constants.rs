// logtrawl - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "logtrawl";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Prescan limits
// =============================================================================

/// Chunk size in bytes for the backward block-scan that locates a file's
/// last parseable line without a full forward read.
pub const BACKWARD_SCAN_CHUNK_SIZE: u64 = 8 * 1024; // 8 KB

/// Maximum number of lines read from the start of a file while looking for
/// its first parseable line. Files whose head is this deep in continuation
/// garbage are treated as having no parseable boundary line.
pub const MAX_FORWARD_SCAN_LINES: usize = 10_000;

// =============================================================================
// Loading limits
// =============================================================================

/// File size threshold in bytes above which files are read via mmap
/// instead of being copied into a heap buffer.
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100 MB

/// Retry limits for transient I/O errors during file reads.
pub const MAX_READ_RETRIES: u32 = 3;
pub const READ_RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

// =============================================================================
// Display
// =============================================================================

/// chrono format string for timestamps in display rows
/// (millisecond precision).
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// CLI
// =============================================================================

/// chrono format string accepted for --since / --until window bounds.
pub const WINDOW_BOUND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How often the CLI polls the engine for load progress (ms).
pub const LOAD_POLL_INTERVAL_MS: u64 = 50;
