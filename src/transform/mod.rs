// src/transform/mod.rs

//! Transforms and the registry that maps task names to them.
//!
//! A transform is the per-file work of a task: it receives one input path
//! and reports whether it wrote an output, skipped the file, or failed.
//! Transforms hold no mutable state; everything they need at call time comes
//! from the shared [`TransformContext`].
//!
//! - [`patterns`] compiles input/exclude globs.
//! - [`registry`] owns the task name → transform mapping.
//! - [`builtin`] instantiates the transforms named in the project file.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::TransformError;
use crate::fs::FileSystem;
use crate::watch::path_utils::relative_str;

pub mod builtin;
pub mod clean;
pub mod command;
pub mod copy;
pub mod env_config;
pub mod manifest;
pub mod patterns;
pub mod registry;
pub mod sass;
pub mod template;

pub use patterns::InputPatterns;
pub use registry::{RegisteredTask, TransformRegistry};

/// Result of applying a transform to one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    Written(PathBuf),
    Skipped(String),
    Failed(TransformError),
}

impl TransformOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        TransformOutcome::Failed(TransformError::new(message))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TransformOutcome::Failed(_))
    }
}

impl From<anyhow::Result<PathBuf>> for TransformOutcome {
    fn from(res: anyhow::Result<PathBuf>) -> Self {
        match res {
            Ok(path) => TransformOutcome::Written(path),
            Err(err) => TransformOutcome::Failed(err.into()),
        }
    }
}

/// Boxed future returned by [`Transform::apply`].
pub type TransformFuture<'a> = Pin<Box<dyn Future<Output = TransformOutcome> + Send + 'a>>;

/// Shared, read-only state every transform invocation can see.
#[derive(Debug, Clone)]
pub struct TransformContext {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    /// Resolved environment name (e.g. `"development"`).
    pub env_name: String,
    pub fs: Arc<dyn FileSystem>,
}

impl TransformContext {
    pub fn new(
        source_root: impl Into<PathBuf>,
        dest_root: impl Into<PathBuf>,
        env_name: impl Into<String>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            env_name: env_name.into(),
            fs,
        }
    }

    /// `input` relative to the source root, forward slashes.
    pub fn relative(&self, input: &Path) -> Option<String> {
        relative_str(&self.source_root, input)
    }
}

/// Where a transform puts its output, relative to the destination root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputLayout {
    /// Extra directory below the destination root.
    pub subdir: Option<String>,
    /// Replacement extension (without the dot).
    pub extension: Option<String>,
}

impl OutputLayout {
    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        if self.extension.is_none() {
            self.extension = Some(ext.into());
        }
        self
    }

    /// Output path for `input`: `<dest>/<subdir>/<rel>` with the extension
    /// replaced when configured.
    pub fn output_for(&self, ctx: &TransformContext, input: &Path) -> Option<PathBuf> {
        let rel = ctx.relative(input)?;
        let mut out = ctx.dest_root.clone();
        if let Some(subdir) = &self.subdir {
            out.push(subdir);
        }
        out.push(rel);
        if let Some(ext) = &self.extension {
            out.set_extension(ext);
        }
        Some(out)
    }
}

/// Per-file conversion applied by a task.
pub trait Transform: Send + Sync + fmt::Debug {
    /// Short identifier used in logs (e.g. `"sass"`).
    fn kind(&self) -> &str;

    fn apply<'a>(&'a self, ctx: &'a TransformContext, input: &'a Path) -> TransformFuture<'a>;

    /// Invoke once per run with the source root instead of once per
    /// matched input. The transform enumerates its own inputs.
    fn once_per_run(&self) -> bool {
        false
    }
}

/// Adapter turning a synchronous function into a [`Transform`].
///
/// This is the simplest way to declare a custom task programmatically.
pub struct FnTransform<F> {
    kind: String,
    f: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&TransformContext, &Path) -> TransformOutcome + Send + Sync,
{
    pub fn new(kind: impl Into<String>, f: F) -> Self {
        Self {
            kind: kind.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnTransform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&TransformContext, &Path) -> TransformOutcome + Send + Sync,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move { (self.f)(ctx, input) })
    }
}

/// Run synchronous [`FileSystem`] work on the blocking pool.
pub(crate) async fn blocking_fs<F>(work: F) -> TransformOutcome
where
    F: FnOnce() -> TransformOutcome + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(outcome) => outcome,
        Err(err) => TransformOutcome::failed(format!("filesystem worker panicked: {err}")),
    }
}

/// `_name.ext` files are partials: only ever pulled in by other files.
pub(crate) fn is_partial(input: &Path) -> bool {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}
