// src/engine/pending.rs

use std::collections::BTreeSet;

use tracing::debug;

/// Changes that arrived while a run was active.
///
/// Every batch sealed during a run is merged here; when the run completes
/// the core drains the union and starts exactly one follow-up run for it.
/// Paths are relative to the source root.
#[derive(Debug, Default)]
pub struct PendingChanges {
    paths: BTreeSet<String>,
    /// A full rebuild was requested while running.
    full: bool,
    batches: usize,
}

/// Everything drained from [`PendingChanges`] at once.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DrainedChanges {
    pub paths: BTreeSet<String>,
    pub full: bool,
    pub batches: usize,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the paths of one sealed batch.
    pub fn record_batch<I>(&mut self, paths: I, full: bool)
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.paths.len();
        self.paths.extend(paths);
        self.full |= full;
        self.batches += 1;
        debug!(
            new_paths = self.paths.len() - before,
            pending_paths = self.paths.len(),
            pending_batches = self.batches,
            full = self.full,
            "recorded changes for follow-up run"
        );
    }

    pub fn is_empty(&self) -> bool {
        self.batches == 0
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Take all pending changes, leaving the accumulator empty.
    pub fn drain(&mut self) -> DrainedChanges {
        let drained = DrainedChanges {
            paths: std::mem::take(&mut self.paths),
            full: self.full,
            batches: self.batches,
        };
        self.full = false;
        self.batches = 0;
        drained
    }
}
