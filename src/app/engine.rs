// logtrawl - app/engine.rs
//
// The engine owns the full entry set, the discovered type registry, the
// filter criteria, and the currently visible subset. One control flow
// owns the engine: it initiates loads, applies criteria updates, and
// pumps the loader's channel. The background thread never touches this
// state; completed results are installed wholesale on receipt, so a
// reader of the visible list always sees the output of the most recent
// completed recompute, never a partially rebuilt set.

use crate::app::loader::{LoadManager, LoadStart};
use crate::core::filter::{self, CriteriaUpdate, FilterCriteria};
use crate::core::model::{LoadProgress, LogEntry, TimeWindow, TypeRegistry};
use crate::util::error::FilterError;
use std::path::PathBuf;

/// Load lifecycle state. Exactly one load may be in flight; requests made
/// while Loading are rejected, not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
}

/// Log ingestion and filtering engine.
pub struct LogEngine {
    loader: LoadManager,
    entries: Vec<LogEntry>,
    types: TypeRegistry,
    criteria: FilterCriteria,
    /// Indices into `entries`: an order-preserving subsequence.
    visible: Vec<usize>,
    /// Last progress percentage reported by the in-flight load.
    progress: u8,
}

impl LogEngine {
    pub fn new() -> Self {
        Self {
            loader: LoadManager::new(),
            entries: Vec::new(),
            types: TypeRegistry::new(),
            criteria: FilterCriteria::new(),
            visible: Vec::new(),
            progress: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Start loading `files` (in the given order) against `window`.
    ///
    /// Returns `AlreadyLoading` when a load is in flight; the rejected
    /// request has no effect and must be resubmitted after completion.
    pub fn start_load(&mut self, files: Vec<PathBuf>, window: TimeWindow) -> LoadStart {
        let outcome = self.loader.start_load(files, window);
        if outcome == LoadStart::Started {
            self.progress = 0;
        }
        outcome
    }

    pub fn load_state(&self) -> LoadState {
        if self.loader.is_loading() {
            LoadState::Loading
        } else {
            LoadState::Idle
        }
    }

    /// Drain pending loader messages, installing a completed result when
    /// one arrived. Returns true when a load completed during this pump
    /// (the entry set was replaced and the visible list recomputed).
    ///
    /// Non-blocking; intended to be called from the owner's poll loop.
    pub fn pump(&mut self) -> bool {
        let mut completed = false;
        for msg in self.loader.poll_progress() {
            match msg {
                LoadProgress::FileProcessed {
                    path,
                    files_processed,
                    total_candidates,
                    percent,
                } => {
                    tracing::debug!(
                        file = %path.display(),
                        files_processed,
                        total_candidates,
                        percent,
                        "Load progress"
                    );
                    self.progress = percent;
                }
                LoadProgress::Completed { entries, types } => {
                    // Wholesale replacement: entries and registry swap in
                    // together, then the visible list is rebuilt against
                    // the unchanged criteria.
                    self.entries = entries;
                    self.types = types;
                    self.progress = 100;
                    self.loader.finish();
                    self.recompute();
                    completed = true;
                }
            }
        }
        completed
    }

    /// Last reported load progress, 0-100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    // -------------------------------------------------------------------------
    // Criteria
    // -------------------------------------------------------------------------

    /// Apply a criteria update and synchronously recompute the visible
    /// list.
    ///
    /// On an invalid search regex the update is not installed, the
    /// previous visible list is retained unchanged, and the error is
    /// returned (and logged).
    pub fn apply_criteria(&mut self, update: CriteriaUpdate) -> Result<(), FilterError> {
        if let Err(e) = self.criteria.apply_update(update) {
            tracing::warn!(error = %e, "Criteria update rejected, visible list retained");
            return Err(e);
        }
        self.recompute();
        Ok(())
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    fn recompute(&mut self) {
        self.visible = filter::apply_criteria(&self.entries, &self.criteria);
        tracing::debug!(
            visible = self.visible.len(),
            total = self.entries.len(),
            "Visible list recomputed"
        );
    }

    // -------------------------------------------------------------------------
    // Read surface
    // -------------------------------------------------------------------------

    /// The full entry set from the most recent completed load.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The currently visible entries, in entry-set order.
    pub fn visible_entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.visible.iter().map(|&idx| &self.entries[idx])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Distinct types discovered by the most recent completed load, in
    /// first-seen order.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }
}

impl Default for LogEngine {
    fn default() -> Self {
        Self::new()
    }
}
