// src/watch/batch.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::types::ChangeKind;

/// One raw filesystem change as delivered by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl RawChange {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Debounced set of changed paths.
///
/// Each path appears once, with the kind of its latest change. A *full*
/// batch stands for "every input changed" and carries no paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    changes: BTreeMap<PathBuf, ChangeKind>,
    opened_at: SystemTime,
    sealed_at: Option<SystemTime>,
    event_count: usize,
    full: bool,
}

impl ChangeBatch {
    /// Open a batch with its first event.
    pub fn open(first: RawChange) -> Self {
        let mut batch = Self {
            changes: BTreeMap::new(),
            opened_at: SystemTime::now(),
            sealed_at: None,
            event_count: 0,
            full: false,
        };
        batch.push(first);
        batch
    }

    /// A sealed synthetic batch meaning "everything changed".
    pub fn full() -> Self {
        let now = SystemTime::now();
        Self {
            changes: BTreeMap::new(),
            opened_at: now,
            sealed_at: Some(now),
            event_count: 0,
            full: true,
        }
    }

    /// A sealed batch over `changes`, mostly for tests and replay.
    pub fn from_changes<I>(changes: I) -> Self
    where
        I: IntoIterator<Item = RawChange>,
    {
        let mut batch = Self {
            changes: BTreeMap::new(),
            opened_at: SystemTime::now(),
            sealed_at: None,
            event_count: 0,
            full: false,
        };
        for change in changes {
            batch.push(change);
        }
        batch.seal();
        batch
    }

    pub fn push(&mut self, change: RawChange) {
        self.event_count += 1;
        self.changes.insert(change.path, change.kind);
    }

    pub fn seal(&mut self) {
        self.sealed_at = Some(SystemTime::now());
    }

    /// Fold `other` into this batch; later kinds win.
    pub fn merge(&mut self, other: ChangeBatch) {
        self.event_count += other.event_count;
        self.full |= other.full;
        self.changes.extend(other.changes);
        if let Some(sealed) = other.sealed_at {
            self.sealed_at = Some(sealed);
        }
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed_at.is_some()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.changes.keys().map(PathBuf::as_path)
    }

    pub fn changes(&self) -> impl Iterator<Item = (&Path, ChangeKind)> {
        self.changes.iter().map(|(p, k)| (p.as_path(), *k))
    }

    pub fn kind_of(&self, path: &Path) -> Option<ChangeKind> {
        self.changes.get(path).copied()
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && !self.full
    }

    /// Raw events folded into this batch.
    pub fn event_count(&self) -> usize {
        self.event_count
    }

    pub fn opened_at(&self) -> SystemTime {
        self.opened_at
    }

    pub fn sealed_at(&self) -> Option<SystemTime> {
        self.sealed_at
    }
}
