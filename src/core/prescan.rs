// logtrawl - core/prescan.rs
//
// Time-window prescan: decide from a file's boundary lines alone whether
// it can possibly intersect a requested [start, end] window, so whole
// files outside the window are excluded without a full sequential read.
//
// - The first parseable line bounds the file from below: if it is already
//   after `end`, every record in the file is after the window.
// - The last parseable line bounds the file from above: if it is before
//   `start`, every record is before the window. It is located with a
//   backward block-scan (seek from EOF in fixed-size chunks) so large
//   rotated files are never read front to back.
//
// This is only a file-level shortcut. The loader's per-entry check is the
// authoritative filter and the prescan must never change the final entry
// set, only which files get read.
//
// Fail-closed: if either boundary line cannot be read or parsed the file
// is excluded from the load pass and the failure is logged, never raised.
// A corrupt file therefore cannot abort a batch load, at the cost of
// silently dropping it.

use crate::core::model::TimeWindow;
use crate::core::parser;
use crate::util::constants::{BACKWARD_SCAN_CHUNK_SIZE, MAX_FORWARD_SCAN_LINES};
use crate::util::error::PrescanError;
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Returns true when `path` may contain entries inside `window`.
///
/// Callers should only invoke this when at least one bound is set; an
/// unbounded window trivially returns true without touching the file.
pub fn file_in_window(path: &Path, window: &TimeWindow) -> bool {
    if window.is_unbounded() {
        return true;
    }

    if let Some(end) = window.end {
        match first_parseable_timestamp(path) {
            Ok(first) if first > end => {
                tracing::debug!(
                    file = %path.display(),
                    first = %first,
                    end = %end,
                    "Prescan: file starts after window end, excluded"
                );
                return false;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Prescan: boundary read failed, file excluded");
                return false;
            }
        }
    }

    if let Some(start) = window.start {
        match last_parseable_timestamp(path) {
            Ok(last) if last < start => {
                tracing::debug!(
                    file = %path.display(),
                    last = %last,
                    start = %start,
                    "Prescan: file ends before window start, excluded"
                );
                return false;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Prescan: boundary read failed, file excluded");
                return false;
            }
        }
    }

    true
}

/// Timestamp of the first line in `path` that matches the log grammar.
///
/// Forward scan, capped at `MAX_FORWARD_SCAN_LINES` so a file whose head is
/// pure continuation noise does not degenerate into a full read.
pub fn first_parseable_timestamp(path: &Path) -> Result<NaiveDateTime, PrescanError> {
    let file = File::open(path).map_err(|source| PrescanError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    for line in BufReader::new(file).lines().take(MAX_FORWARD_SCAN_LINES) {
        let line = line.map_err(|source| PrescanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(ts) = parser::parse_line_timestamp(&line) {
            return Ok(ts);
        }
    }

    Err(PrescanError::NoParseableLine {
        path: path.to_path_buf(),
    })
}

/// Timestamp of the last line in `path` that matches the log grammar.
///
/// Backward block-scan: reads fixed-size chunks from the end of the file,
/// accumulating until the buffered region contains at least one parseable
/// line, then returns the last such line's timestamp. Trailing
/// continuation lines (stack traces at EOF) simply extend the scan to the
/// preceding chunk.
pub fn last_parseable_timestamp(path: &Path) -> Result<NaiveDateTime, PrescanError> {
    let io_err = |source| PrescanError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();

    let mut pos = len;
    let mut buffer: Vec<u8> = Vec::new();

    while pos > 0 {
        let chunk_len = pos.min(BACKWARD_SCAN_CHUNK_SIZE);
        pos -= chunk_len;

        file.seek(SeekFrom::Start(pos)).map_err(io_err)?;
        let mut chunk = vec![0u8; chunk_len as usize];
        file.read_exact(&mut chunk).map_err(io_err)?;

        chunk.extend_from_slice(&buffer);
        buffer = chunk;

        // Unless the scan has reached the file start, the first buffered
        // line may be a fragment split across the chunk boundary; skip it
        // when looking for a parseable line.
        let text = String::from_utf8_lossy(&buffer);
        let lines: Vec<&str> = text.lines().collect();
        let complete = if pos > 0 && !lines.is_empty() {
            &lines[1..]
        } else {
            &lines[..]
        };
        for line in complete.iter().rev() {
            if let Some(ts) = parser::parse_line_timestamp(line) {
                return Ok(ts);
            }
        }
    }

    Err(PrescanError::NoParseableLine {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ts(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn log_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn first_timestamp_skips_leading_continuations() {
        let file = log_file(&[
            "  continuation noise",
            "ERROR   : 2024-01-05 08:00:00: first real entry",
            "INFO    : 2024-01-05 09:00:00: second",
        ]);
        let first = first_parseable_timestamp(file.path()).unwrap();
        assert_eq!(first, ts(5, 8));
    }

    #[test]
    fn last_timestamp_skips_trailing_continuations() {
        let file = log_file(&[
            "INFO    : 2024-01-05 08:00:00: start",
            "ERROR   : 2024-01-05 10:00:00: boom",
            "    at com.example.Main.run(Main.java:42)",
            "    at com.example.Main.main(Main.java:7)",
        ]);
        let last = last_parseable_timestamp(file.path()).unwrap();
        assert_eq!(last, ts(5, 10));
    }

    #[test]
    fn backward_scan_crosses_chunk_boundaries() {
        // Build a file much larger than one backward-scan chunk where the
        // last parseable line sits ahead of a long run of continuation
        // lines, forcing the scan through several chunks.
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "INFO    : 2024-01-05 08:00:00: head").unwrap();
        writeln!(file, "ERROR   : 2024-01-05 10:00:00: last real entry").unwrap();
        let filler = "x".repeat(200);
        for _ in 0..((BACKWARD_SCAN_CHUNK_SIZE as usize * 3) / filler.len()) {
            writeln!(file, "{filler}").unwrap();
        }
        file.flush().unwrap();

        let last = last_parseable_timestamp(file.path()).unwrap();
        assert_eq!(last, ts(5, 10));
    }

    #[test]
    fn no_parseable_line_is_an_explicit_error() {
        let file = log_file(&["garbage", "more garbage"]);
        assert!(matches!(
            first_parseable_timestamp(file.path()),
            Err(PrescanError::NoParseableLine { .. })
        ));
        assert!(matches!(
            last_parseable_timestamp(file.path()),
            Err(PrescanError::NoParseableLine { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::path::Path::new("/nonexistent/logtrawl-prescan-test.log");
        assert!(matches!(
            first_parseable_timestamp(path),
            Err(PrescanError::Io { .. })
        ));
    }

    #[test]
    fn file_after_window_is_excluded() {
        let file = log_file(&[
            "INFO    : 2024-01-10 08:00:00: too late",
            "INFO    : 2024-01-11 08:00:00: later still",
        ]);
        let window = TimeWindow {
            start: None,
            end: Some(ts(9, 23)),
        };
        assert!(!file_in_window(file.path(), &window));
    }

    #[test]
    fn file_before_window_is_excluded() {
        let file = log_file(&[
            "INFO    : 2024-01-01 08:00:00: old",
            "INFO    : 2024-01-02 08:00:00: still old",
        ]);
        let window = TimeWindow {
            start: Some(ts(5, 0)),
            end: None,
        };
        assert!(!file_in_window(file.path(), &window));
    }

    #[test]
    fn overlapping_file_is_kept() {
        let file = log_file(&[
            "INFO    : 2024-01-04 08:00:00: before window",
            "INFO    : 2024-01-06 08:00:00: inside window",
        ]);
        let window = TimeWindow {
            start: Some(ts(5, 0)),
            end: Some(ts(7, 0)),
        };
        assert!(file_in_window(file.path(), &window));
    }

    #[test]
    fn unreadable_file_is_excluded_fail_closed() {
        let window = TimeWindow {
            start: Some(ts(5, 0)),
            end: None,
        };
        let path = std::path::Path::new("/nonexistent/logtrawl-prescan-test.log");
        assert!(!file_in_window(path, &window));
    }

    #[test]
    fn unbounded_window_skips_the_file_entirely() {
        // Even a nonexistent path passes: no bounds means no prescan.
        let path = std::path::Path::new("/nonexistent/never-read.log");
        assert!(file_in_window(path, &TimeWindow::unbounded()));
    }
}
