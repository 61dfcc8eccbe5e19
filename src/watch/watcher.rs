// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::types::ChangeKind;
use crate::watch::batch::RawChange;

/// Live subscription on a directory tree.
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe))
/// stops watching.
pub struct WatchHandle {
    root: PathBuf,
    inner: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("root", &self.root)
            .field("active", &self.inner.is_some())
            .finish()
    }
}

impl WatchHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    pub fn unsubscribe(&mut self) {
        if let Some(mut watcher) = self.inner.take() {
            if let Err(err) = watcher.unwatch(&self.root) {
                debug!(error = %err, "unwatch failed");
            }
            info!(root = ?self.root, "file watcher stopped");
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Watch `root` recursively and forward every change as a [`RawChange`].
///
/// `root` is canonicalized so forwarded paths share a stable prefix.
pub fn subscribe(
    root: impl Into<PathBuf>,
    raw_tx: mpsc::UnboundedSender<RawChange>,
) -> Result<WatchHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let Some(kind) = change_kind(&event.kind) else {
                    return;
                };
                for path in event.paths {
                    if raw_tx.send(RawChange { path, kind }).is_err() {
                        // Receiver gone; the handle will be dropped shortly.
                        return;
                    }
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {:?}", root))?;

    info!("file watcher started on {:?}", root);

    Ok(WatchHandle {
        root,
        inner: Some(watcher),
    })
}

/// Map a notify event kind to a change kind. Access and unknown events are
/// ignored.
pub fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Added),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Added),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}
