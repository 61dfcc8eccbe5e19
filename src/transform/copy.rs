// src/transform/copy.rs

use std::path::Path;
use std::sync::Arc;

use crate::fs::{CopyOptions, copy};
use crate::transform::{
    OutputLayout, Transform, TransformContext, TransformFuture, TransformOutcome, blocking_fs,
};

/// Copies each input verbatim to `<dest>/<subdir>/<rel>`.
#[derive(Debug, Clone)]
pub struct CopyTransform {
    layout: OutputLayout,
    overwrite: bool,
}

impl CopyTransform {
    pub fn new(layout: OutputLayout, overwrite: bool) -> Self {
        Self { layout, overwrite }
    }
}

impl Transform for CopyTransform {
    fn kind(&self) -> &str {
        "copy"
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            let Some(output) = self.layout.output_for(ctx, input) else {
                return TransformOutcome::failed(format!(
                    "input {:?} is outside the source root",
                    input
                ));
            };

            let fs = Arc::clone(&ctx.fs);
            let input = input.to_path_buf();
            let opts = CopyOptions {
                overwrite: self.overwrite,
                matching: Vec::new(),
            };
            blocking_fs(move || {
                if !opts.overwrite && fs.exists(&output) {
                    return TransformOutcome::Skipped("destination exists".to_string());
                }
                copy(fs.as_ref(), &input, &output, &opts)
                    .map(|_| output)
                    .into()
            })
            .await
        })
    }
}
