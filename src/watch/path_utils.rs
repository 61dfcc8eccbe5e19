// src/watch/path_utils.rs

//! Path helpers shared by the watcher, the scheduler and the runner.

use std::path::{Component, Path, PathBuf};

/// Render a relative path with forward slashes, the form glob patterns are
/// matched against.
pub fn slash_path(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Convert `path` into a string relative to `root`, with forward slashes.
///
/// - First a direct `strip_prefix(root)`.
/// - If that fails (symlinked roots, `/private/var` on macOS, ...), both
///   paths are canonicalized and stripped again.
///
/// Returns `None` if the path does not live under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slash_path(rel));
    }

    // A removed file cannot be canonicalized; fall back to its parent.
    let root_canon = root.canonicalize().ok()?;
    let path_canon = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let parent = path.parent()?.canonicalize().ok()?;
            parent.join(path.file_name()?)
        }
    };

    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(slash_path)
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// A leading `..` that cannot be popped is kept.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// True when one of `a`, `b` contains the other (or they are the same
/// directory) after lexical normalization.
///
/// Paths are only comparable when both are absolute, or both relative and
/// climbing the same number of leading `..`; anything else is treated as
/// disjoint.
pub fn paths_nest(a: &Path, b: &Path) -> bool {
    let a = lexical_normalize(a);
    let b = lexical_normalize(b);
    if a.is_absolute() != b.is_absolute() || leading_parents(&a) != leading_parents(&b) {
        return false;
    }
    a.starts_with(&b) || b.starts_with(&a)
}

fn leading_parents(path: &Path) -> usize {
    path.components()
        .take_while(|c| matches!(c, Component::ParentDir))
        .count()
}
