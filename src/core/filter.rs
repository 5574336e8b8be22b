// logtrawl - core/filter.rs
//
// Filter criteria and the visible-subset computation.
// Core layer: pure logic, no I/O.
//
// The two filters AND-combine: an entry is visible when it passes the
// type filter (disabled, or no type selected, or exact type match) and
// the search filter (disabled, or empty pattern, or regex match anywhere
// in the message). The search regex is compiled once when the pattern
// text changes, never during recompute, so an invalid pattern surfaces at
// the point of change and recompute itself cannot fail.

use crate::core::model::LogEntry;
use crate::util::error::FilterError;
use regex::Regex;

/// The active filter criteria. Mutated only through `apply_update`.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Exact type to keep when the type filter is enabled. Empty = no
    /// restriction even when enabled.
    pub selected_type: String,

    /// Whether the type filter participates in the predicate.
    pub type_filter_enabled: bool,

    /// Search regex source text. Empty = no restriction even when enabled.
    pub search_pattern: String,

    /// Whether the search filter participates in the predicate.
    pub search_enabled: bool,

    /// Compiled form of `search_pattern`. None when the pattern is empty.
    compiled_search: Option<Regex>,
}

/// A batch of criteria changes. Unset fields leave the current value
/// untouched, so callers can flip a single flag without restating the
/// rest of the criteria.
#[derive(Debug, Clone, Default)]
pub struct CriteriaUpdate {
    pub selected_type: Option<String>,
    pub type_filter_enabled: Option<bool>,
    pub search_pattern: Option<String>,
    pub search_enabled: Option<bool>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an update, recompiling the search regex only when the pattern
    /// text actually changed.
    ///
    /// On an invalid pattern the criteria are left completely unchanged
    /// and the error is returned, so the caller's previously computed
    /// visible list stays valid.
    pub fn apply_update(&mut self, update: CriteriaUpdate) -> Result<(), FilterError> {
        // Validate before mutating anything.
        let compiled = match &update.search_pattern {
            Some(pattern) if *pattern != self.search_pattern => {
                if pattern.is_empty() {
                    Some(None)
                } else {
                    let regex =
                        Regex::new(pattern).map_err(|source| FilterError::InvalidRegex {
                            pattern: pattern.clone(),
                            source,
                        })?;
                    Some(Some(regex))
                }
            }
            _ => None, // Pattern absent or unchanged: keep the cached regex.
        };

        if let Some(selected_type) = update.selected_type {
            self.selected_type = selected_type;
        }
        if let Some(enabled) = update.type_filter_enabled {
            self.type_filter_enabled = enabled;
        }
        if let Some(pattern) = update.search_pattern {
            self.search_pattern = pattern;
        }
        if let Some(regex) = compiled {
            self.compiled_search = regex;
        }
        if let Some(enabled) = update.search_enabled {
            self.search_enabled = enabled;
        }
        Ok(())
    }

    /// Check whether a single entry passes both filters.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if self.type_filter_enabled
            && !self.selected_type.is_empty()
            && entry.log_type != self.selected_type
        {
            return false;
        }

        if self.search_enabled && !self.search_pattern.is_empty() {
            match &self.compiled_search {
                Some(regex) => {
                    if !regex.is_match(&entry.message) {
                        return false;
                    }
                }
                // Pattern text present but nothing compiled: cannot happen
                // through apply_update; treat as no restriction.
                None => {}
            }
        }

        true
    }
}

/// Apply the criteria to the full entry set, returning indices of visible
/// entries.
///
/// Returns a Vec of indices into the original slice — an order-preserving
/// subsequence. This avoids copying entries and keeps the visible view a
/// cheap projection over the wholesale-replaced entry set.
pub fn apply_criteria(entries: &[LogEntry], criteria: &FilterCriteria) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| criteria.matches(entry))
        .map(|(idx, _)| idx)
        .collect()
}
