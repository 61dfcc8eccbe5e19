// src/transform/clean.rs

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::fs::empty_dir;
use crate::transform::{Transform, TransformContext, TransformFuture, blocking_fs};

/// Empties the destination tree, keeping the directory itself.
#[derive(Debug, Clone, Default)]
pub struct CleanTransform;

impl Transform for CleanTransform {
    fn kind(&self) -> &str {
        "clean"
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, _input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            info!(dest = ?ctx.dest_root, "cleaning destination");
            let fs = Arc::clone(&ctx.fs);
            let dest = ctx.dest_root.clone();
            blocking_fs(move || empty_dir(fs.as_ref(), &dest).map(|()| dest).into()).await
        })
    }
}
