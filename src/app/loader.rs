// logtrawl - app/loader.rs
//
// Load lifecycle management. Runs the prescan-and-parse pipeline on a
// background thread, sending progress messages to the owning thread via
// an mpsc channel.
//
// Architecture:
//   - `LoadManager` lives on the owning thread; `run_load` runs on a
//     background thread.
//   - All cross-thread communication is via `LoadProgress` channel
//     messages; the background thread only computes and hands back
//     immutable results, it never touches the engine's state.
//   - Exactly one load per manager may be in flight. A request made while
//     one is running returns `LoadStart::AlreadyLoading` and has no other
//     effect: no queueing, no supersession, no cancellation. Criteria or
//     file-set changes made during a load must be resubmitted afterwards.
//
// Per-file read errors are non-fatal: the file is skipped (still counting
// toward progress) and the pass continues.

use crate::core::model::{LoadProgress, LogEntry, TimeWindow, TypeRegistry};
use crate::core::parser;
use crate::core::prescan;
use crate::util::constants::{LARGE_FILE_THRESHOLD, MAX_READ_RETRIES, READ_RETRY_DELAYS_MS};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// Outcome of a load request. Rejection is an explicit, observable result
/// rather than a silent drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStart {
    /// The load was accepted and a background thread spawned.
    Started,

    /// A load is already in flight; this request was discarded and its
    /// parameters have no effect on the running load.
    AlreadyLoading,
}

// =============================================================================
// LoadManager
// =============================================================================

/// Manages a single load operation on a background thread.
pub struct LoadManager {
    /// Channel receiver for the owner to poll progress messages.
    progress_rx: Option<mpsc::Receiver<LoadProgress>>,

    /// True from an accepted `start_load` until the owner acknowledges the
    /// completion message via `finish()`.
    loading: bool,
}

impl LoadManager {
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            loading: false,
        }
    }

    /// Start loading `files` (in the given order) against `window`.
    ///
    /// Spawns a background thread immediately; progress arrives over the
    /// channel. Returns `AlreadyLoading` without side effects if a load is
    /// in flight.
    pub fn start_load(&mut self, files: Vec<PathBuf>, window: TimeWindow) -> LoadStart {
        if self.loading {
            tracing::warn!("Load requested while another is in flight, rejected");
            return LoadStart::AlreadyLoading;
        }

        let (tx, rx) = mpsc::channel();
        self.progress_rx = Some(rx);
        self.loading = true;

        let file_count = files.len();
        std::thread::spawn(move || {
            run_load(files, window, tx);
        });

        tracing::info!(files = file_count, "Load started");
        LoadStart::Started
    }

    /// True between an accepted start and the acknowledged completion.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Poll for progress messages without blocking. Returns all pending
    /// messages in send order.
    pub fn poll_progress(&self) -> Vec<LoadProgress> {
        let mut messages = Vec::new();
        if let Some(ref rx) = self.progress_rx {
            while let Ok(msg) = rx.try_recv() {
                messages.push(msg);
            }
        }
        messages
    }

    /// Acknowledge a received completion message, returning the manager to
    /// the idle state so the next load can start.
    pub fn finish(&mut self) {
        self.loading = false;
        self.progress_rx = None;
    }
}

impl Default for LoadManager {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Background load pipeline
// =============================================================================

/// Full load pipeline: prescan → per-file parse → completion.
///
/// Runs on a background thread. Sends `LoadProgress` messages to `tx`;
/// the completion message is always the last one for the load.
fn run_load(files: Vec<PathBuf>, window: TimeWindow, tx: mpsc::Sender<LoadProgress>) {
    macro_rules! send {
        ($msg:expr) => {
            if tx.send($msg).is_err() {
                return; // Receiver dropped (owner gone); exit quietly.
            }
        };
    }

    // -------------------------------------------------------------------------
    // Phase 1: Prescan (only when the window is bounded).
    //
    // Shrinks the candidate list by boundary-line checks; file order is
    // preserved. The per-entry check below remains authoritative, so the
    // prescan can only affect which files are read, never the entry set.
    // -------------------------------------------------------------------------
    let candidates: Vec<PathBuf> = if window.is_unbounded() {
        files
    } else {
        files
            .into_iter()
            .filter(|path| prescan::file_in_window(path, &window))
            .collect()
    };

    let total_candidates = candidates.len();

    // -------------------------------------------------------------------------
    // Phase 2: Parse every line of every surviving file, file order then
    // in-file line order. Entries are concatenated across files, never
    // merged by timestamp; callers supply files pre-ordered when temporal
    // ordering of the combined result matters.
    // -------------------------------------------------------------------------
    let mut entries: Vec<LogEntry> = Vec::new();
    let mut types = TypeRegistry::new();

    for (idx, path) in candidates.iter().enumerate() {
        match read_file_content(path) {
            Ok(content) => {
                let before = entries.len();
                for (line_idx, line) in content.lines().enumerate() {
                    let line_number = (line_idx as u64) + 1;
                    if let Some(entry) = parser::parse_line(line_number, line, path) {
                        // Authoritative, exact bound check on the parsed
                        // timestamp.
                        if !window.contains(entry.timestamp) {
                            continue;
                        }
                        types.record(&entry.log_type);
                        entries.push(entry);
                    }
                }
                tracing::debug!(
                    file = %path.display(),
                    entries = entries.len() - before,
                    "File parsed"
                );
            }
            Err(e) => {
                // Non-fatal: skip the file, keep the batch going.
                tracing::warn!(
                    file = %path.display(),
                    error = %e,
                    "Cannot read file, skipped"
                );
            }
        }

        let files_processed = idx + 1;
        let percent =
            ((files_processed as f64) * 100.0 / (total_candidates as f64)).round() as u8;
        send!(LoadProgress::FileProcessed {
            path: path.clone(),
            files_processed,
            total_candidates,
            percent,
        });
    }

    tracing::info!(
        files = total_candidates,
        entries = entries.len(),
        types = types.len(),
        "Load complete"
    );

    send!(LoadProgress::Completed { entries, types });
}

// =============================================================================
// File reading helpers
// =============================================================================

/// Read the full content of a file as a UTF-8 string.
///
/// Large files are read through `memmap2`, avoiding a heap copy of the
/// whole file during the UTF-8 check. Smaller files use `read_to_string`
/// with capped retries for transient I/O errors.
fn read_file_content(path: &Path) -> io::Result<String> {
    let size = std::fs::metadata(path)?.len();
    if size > LARGE_FILE_THRESHOLD {
        read_large_file(path)
    } else {
        read_small_file_with_retry(path)
    }
}

/// Read using `memmap2` for large files.
fn read_large_file(path: &Path) -> io::Result<String> {
    let file = std::fs::File::open(path)?;
    // SAFETY: the file is read-only and the map is never mutated. External
    // modification of the file during the map's lifetime is the documented
    // residual risk, acceptable for reading already-rotated log files.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    std::str::from_utf8(&mmap)
        .map(|s| s.to_string())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Read a small file with transient-error retries.
fn read_small_file_with_retry(path: &Path) -> io::Result<String> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_READ_RETRIES {
        match std::fs::read_to_string(path) {
            Ok(content) => return Ok(content),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(
                    READ_RETRY_DELAYS_MS[attempt as usize],
                ));
                last_err = Some(e);
            }
            Err(e) => return Err(e), // Permanent error; do not retry.
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown read error")))
}

/// Returns true for transient I/O errors that are worth retrying.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_log(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    /// Drain the channel until the completion message arrives.
    fn collect_to_completion(manager: &mut LoadManager) -> Vec<LoadProgress> {
        let mut all = Vec::new();
        loop {
            for msg in manager.poll_progress() {
                let done = matches!(msg, LoadProgress::Completed { .. });
                all.push(msg);
                if done {
                    manager.finish();
                    return all;
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn load_concatenates_files_in_supplied_order() {
        let dir = TempDir::new().unwrap();
        let newer = write_log(
            &dir,
            "app.log",
            &["INFO    : 2024-01-05 10:00:00: newer entry"],
        );
        let older = write_log(
            &dir,
            "app.log.1",
            &[
                "INFO    : 2024-01-04 10:00:00: older entry",
                "not a log line",
                "ERROR   : 2024-01-04 11:00:00: older error",
            ],
        );

        let mut manager = LoadManager::new();
        assert_eq!(
            manager.start_load(vec![older, newer], TimeWindow::unbounded()),
            LoadStart::Started
        );
        let messages = collect_to_completion(&mut manager);

        let Some(LoadProgress::Completed { entries, types }) = messages.last() else {
            panic!("last message must be Completed");
        };

        // Concatenated, not time-merged: supplied order, then line order.
        let lines: Vec<_> = entries.iter().map(|e| (e.line_number, e.message.as_str())).collect();
        assert_eq!(
            lines,
            vec![
                (1, "older entry"),
                (3, "older error"),
                (1, "newer entry"),
            ]
        );

        let seen: Vec<_> = types.iter().collect();
        assert_eq!(seen, vec!["INFO", "ERROR"]);
    }

    #[test]
    fn progress_is_per_file_nondecreasing_and_ends_at_100() {
        let dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..4)
            .map(|i| {
                write_log(
                    &dir,
                    &format!("f{i}.log"),
                    &["INFO    : 2024-01-05 10:00:00: x"],
                )
            })
            .collect();

        let mut manager = LoadManager::new();
        manager.start_load(files, TimeWindow::unbounded());
        let messages = collect_to_completion(&mut manager);

        let percents: Vec<u8> = messages
            .iter()
            .filter_map(|m| match m {
                LoadProgress::FileProcessed { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![25, 50, 75, 100]);
        assert!(matches!(messages.last(), Some(LoadProgress::Completed { .. })));
    }

    #[test]
    fn per_entry_check_is_authoritative_within_a_kept_file() {
        let dir = TempDir::new().unwrap();
        // File straddles the window: prescan keeps it, but only the middle
        // entry survives the exact per-entry check.
        let path = write_log(
            &dir,
            "straddle.log",
            &[
                "INFO    : 2024-01-04 08:00:00: before",
                "INFO    : 2024-01-05 08:00:00: inside",
                "INFO    : 2024-01-06 08:00:00: after",
            ],
        );
        let window = TimeWindow {
            start: Some(
                NaiveDate::from_ymd_opt(2024, 1, 5)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
            end: Some(
                NaiveDate::from_ymd_opt(2024, 1, 5)
                    .unwrap()
                    .and_hms_opt(23, 59, 59)
                    .unwrap(),
            ),
        };

        let mut manager = LoadManager::new();
        manager.start_load(vec![path], window);
        let messages = collect_to_completion(&mut manager);

        let Some(LoadProgress::Completed { entries, .. }) = messages.last() else {
            panic!("last message must be Completed");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "inside");
    }

    #[test]
    fn prescan_excludes_out_of_window_files_from_the_pass() {
        let dir = TempDir::new().unwrap();
        let early = write_log(
            &dir,
            "early.log",
            &["INFO    : 2024-01-01 08:00:00: too old"],
        );
        let inside = write_log(
            &dir,
            "inside.log",
            &["INFO    : 2024-01-05 08:00:00: kept"],
        );
        let window = TimeWindow {
            start: Some(
                NaiveDate::from_ymd_opt(2024, 1, 5)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
            end: None,
        };

        let mut manager = LoadManager::new();
        manager.start_load(vec![early, inside], window);
        let messages = collect_to_completion(&mut manager);

        // Only one candidate survived prescan, so a single progress step.
        let processed: Vec<_> = messages
            .iter()
            .filter_map(|m| match m {
                LoadProgress::FileProcessed {
                    total_candidates, ..
                } => Some(*total_candidates),
                _ => None,
            })
            .collect();
        assert_eq!(processed, vec![1]);

        let Some(LoadProgress::Completed { entries, .. }) = messages.last() else {
            panic!("last message must be Completed");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }

    #[test]
    fn missing_file_is_skipped_and_the_batch_continues() {
        let dir = TempDir::new().unwrap();
        let good = write_log(&dir, "good.log", &["INFO    : 2024-01-05 10:00:00: ok"]);
        let missing = dir.path().join("missing.log");

        let mut manager = LoadManager::new();
        manager.start_load(vec![missing, good], TimeWindow::unbounded());
        let messages = collect_to_completion(&mut manager);

        let Some(LoadProgress::Completed { entries, .. }) = messages.last() else {
            panic!("last message must be Completed");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "ok");
    }

    #[test]
    fn second_load_request_while_loading_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_log(&dir, "a.log", &["INFO    : 2024-01-05 10:00:00: first"]);
        let other = write_log(&dir, "b.log", &["INFO    : 2024-01-05 11:00:00: second"]);

        let mut manager = LoadManager::new();
        assert_eq!(
            manager.start_load(vec![path], TimeWindow::unbounded()),
            LoadStart::Started
        );
        // The manager stays in Loading until the completion message is
        // acknowledged, so the rejection is deterministic even if the
        // background thread already finished.
        assert_eq!(
            manager.start_load(vec![other], TimeWindow::unbounded()),
            LoadStart::AlreadyLoading
        );

        let messages = collect_to_completion(&mut manager);
        let Some(LoadProgress::Completed { entries, .. }) = messages.last() else {
            panic!("last message must be Completed");
        };
        // The installed result is the first load's; the rejected request's
        // parameters had no effect.
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "first");
        assert!(!manager.is_loading());
    }

    #[test]
    fn empty_candidate_list_still_completes() {
        let mut manager = LoadManager::new();
        manager.start_load(Vec::new(), TimeWindow::unbounded());
        let messages = collect_to_completion(&mut manager);
        assert_eq!(messages.len(), 1);
        let Some(LoadProgress::Completed { entries, types }) = messages.last() else {
            panic!("last message must be Completed");
        };
        assert!(entries.is_empty());
        assert!(types.is_empty());
    }
}
