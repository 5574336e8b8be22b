// logtrawl - core/series.rs
//
// Ad-hoc numeric time series derived from regex capture groups in
// message bodies, for trend charting. Operates on the full (unfiltered)
// entry set in its stored order, independent of the visible-subset
// pipeline.

use crate::core::model::LogEntry;
use crate::util::error::SeriesError;
use regex::Regex;

/// One capture group's time series: parallel timestamp/value vectors.
///
/// Series are independently lengthed — a message contributing to group 2
/// but not group 1 grows series 1 only (indices here are zero-based, so
/// series `j` corresponds to capture group `j + 1`). Points from
/// different series are therefore not index-aligned in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub timestamps: Vec<chrono::NaiveDateTime>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Project numeric capture groups from message bodies into time series.
///
/// For each entry whose message matches `pattern`, every capture group
/// with a non-empty captured value contributes one `(timestamp, value)`
/// point to that group's series. A capture that fails to parse as f64
/// contributes `0.0` rather than aborting the extraction; one entry's
/// problems never affect the remaining entries.
///
/// Returns one `Series` per capture group index observed with a non-empty
/// match at least once. An invalid pattern is reported at the point of
/// call.
pub fn extract_series(entries: &[LogEntry], pattern: &str) -> Result<Vec<Series>, SeriesError> {
    let regex = Regex::new(pattern).map_err(|source| SeriesError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut series: Vec<Series> = Vec::new();

    for entry in entries {
        let Some(caps) = regex.captures(&entry.message) else {
            continue;
        };

        // Group 0 is the whole match; series are keyed by explicit groups.
        for group_idx in 1..caps.len() {
            let Some(capture) = caps.get(group_idx) else {
                continue;
            };
            if capture.as_str().is_empty() {
                continue;
            }

            let value = match capture.as_str().parse::<f64>() {
                Ok(v) => v,
                Err(_) => {
                    tracing::debug!(
                        capture = capture.as_str(),
                        line = entry.line_number,
                        "Series: non-numeric capture, substituting 0.0"
                    );
                    0.0
                }
            };

            let slot = group_idx - 1;
            while series.len() <= slot {
                series.push(Series::default());
            }
            series[slot].timestamps.push(entry.timestamp);
            series[slot].values.push(value);
        }
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::path::PathBuf;

    fn ts(s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, s)
            .unwrap()
    }

    fn make_entry(line: u64, message: &str) -> LogEntry {
        LogEntry {
            line_number: line,
            log_type: "INFO".to_string(),
            timestamp: ts(line as u32),
            message: message.to_string(),
            source_file: PathBuf::from("test.log"),
        }
    }

    #[test]
    fn extracts_numeric_captures_with_timestamps() {
        let entries = vec![
            make_entry(1, "temp=93.5 ok"),
            make_entry(2, "no reading here"),
            make_entry(3, "temp=94.25 ok"),
        ];
        let series = extract_series(&entries, r"temp=(\d+\.\d+)").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].values, vec![93.5, 94.25]);
        assert_eq!(series[0].timestamps, vec![ts(1), ts(3)]);
    }

    #[test]
    fn malformed_numeric_substitutes_zero_without_aborting() {
        let entries = vec![
            make_entry(1, "temp=93.5"),
            make_entry(2, "temp=abc"),
            make_entry(3, "temp=95.0"),
        ];
        // The capture group matches any token, numeric or not.
        let series = extract_series(&entries, r"temp=(\S+)").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].values, vec![93.5, 0.0, 95.0]);
        assert_eq!(series[0].len(), 3);
    }

    #[test]
    fn groups_produce_independent_series() {
        let entries = vec![
            make_entry(1, "cpu=10.5"),
            make_entry(2, "mem=2048"),
            make_entry(3, "cpu=11.0 mem=4096"),
        ];
        let series = extract_series(&entries, r"(?:cpu=(\S+))?\s*(?:mem=(\S+))?").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].values, vec![10.5, 11.0]);
        assert_eq!(series[1].values, vec![2048.0, 4096.0]);
        // Not index-aligned: series 0 has entries 1 and 3, series 1 has 2 and 3.
        assert_eq!(series[0].timestamps, vec![ts(1), ts(3)]);
        assert_eq!(series[1].timestamps, vec![ts(2), ts(3)]);
    }

    #[test]
    fn empty_captures_do_not_grow_a_series() {
        let entries = vec![make_entry(1, "value= end")];
        let series = extract_series(&entries, r"value=(\d*)").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_explicit_error() {
        let result = extract_series(&[], "(unclosed");
        assert!(matches!(result, Err(SeriesError::InvalidPattern { .. })));
    }

    #[test]
    fn no_matches_yields_no_series() {
        let entries = vec![make_entry(1, "nothing numeric")];
        let series = extract_series(&entries, r"temp=(\d+)").unwrap();
        assert!(series.is_empty());
    }
}
