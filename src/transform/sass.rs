// src/transform/sass.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::debug;

use crate::transform::{
    InputPatterns, OutputLayout, Transform, TransformContext, TransformFuture, TransformOutcome,
    is_partial,
};
use crate::types::SassStyle;

fn grass_style(style: SassStyle) -> grass::OutputStyle {
    match style {
        SassStyle::Expanded => grass::OutputStyle::Expanded,
        SassStyle::Compressed => grass::OutputStyle::Compressed,
    }
}

/// Compiles `.scss` / `.sass` files to CSS with `grass`.
///
/// `@use` / `@import` are resolved relative to the importing file first and
/// then from the source root.
#[derive(Debug, Clone)]
pub struct SassTransform {
    layout: OutputLayout,
    style: SassStyle,
}

impl SassTransform {
    pub fn new(layout: OutputLayout, style: SassStyle) -> Self {
        Self {
            layout: layout.with_extension("css"),
            style,
        }
    }
}

impl Transform for SassTransform {
    fn kind(&self) -> &str {
        "sass"
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            if is_partial(input) {
                return TransformOutcome::Skipped("partial".to_string());
            }

            let Some(output) = self.layout.output_for(ctx, input) else {
                return TransformOutcome::failed(format!(
                    "input {:?} is outside the source root",
                    input
                ));
            };

            let source = match ctx.fs.read_to_string(input) {
                Ok(s) => s,
                Err(err) => return TransformOutcome::Failed(err.into()),
            };

            let load_paths: Vec<PathBuf> = input
                .parent()
                .map(Path::to_path_buf)
                .into_iter()
                .chain(std::iter::once(ctx.source_root.clone()))
                .collect();
            let style = grass_style(self.style);

            // grass is CPU bound; keep it off the runtime threads.
            let compiled = tokio::task::spawn_blocking(move || {
                let mut options = grass::Options::default().style(style);
                for path in &load_paths {
                    options = options.load_path(path);
                }
                grass::from_string(source, &options).map_err(|e| e.to_string())
            })
            .await;

            match compiled {
                Ok(Ok(css)) => {
                    debug!(input = ?input, output = ?output, "compiled stylesheet");
                    ctx.fs.write(&output, css.as_bytes()).map(|()| output).into()
                }
                Ok(Err(msg)) => TransformOutcome::failed(msg),
                Err(join_err) => {
                    TransformOutcome::failed(format!("stylesheet compiler panicked: {join_err}"))
                }
            }
        })
    }
}

/// Compiles every matched stylesheet into one CSS file.
///
/// Inputs are concatenated in path order before compiling, so later files
/// see the variables and mixins of earlier ones. Partials are left out.
#[derive(Debug, Clone)]
pub struct SassBundleTransform {
    patterns: InputPatterns,
    output: PathBuf,
    style: SassStyle,
}

impl SassBundleTransform {
    /// `output` is relative to the destination root; `.css` is added when it
    /// has no extension.
    pub fn new(patterns: InputPatterns, output: impl Into<PathBuf>, style: SassStyle) -> Self {
        let mut output = output.into();
        if output.extension().is_none() {
            output.set_extension("css");
        }
        Self {
            patterns,
            output,
            style,
        }
    }
}

impl Transform for SassBundleTransform {
    fn kind(&self) -> &str {
        "sass-bundle"
    }

    fn once_per_run(&self) -> bool {
        true
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, _input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            let fs = Arc::clone(&ctx.fs);
            let root = ctx.source_root.clone();
            let patterns = self.patterns.clone();
            let output = ctx.dest_root.join(&self.output);
            let style = grass_style(self.style);

            let bundled = tokio::task::spawn_blocking(move || -> anyhow::Result<(PathBuf, usize)> {
                let files: Vec<PathBuf> = crate::fs::list(fs.as_ref(), &root, &patterns)?
                    .into_iter()
                    .filter(|p| !is_partial(p))
                    .collect();

                let mut source = String::new();
                let mut load_paths: Vec<PathBuf> = Vec::new();
                for file in &files {
                    source.push_str(&fs.read_to_string(file)?);
                    source.push('\n');
                    if let Some(parent) = file.parent() {
                        if !load_paths.iter().any(|p| p == parent) {
                            load_paths.push(parent.to_path_buf());
                        }
                    }
                }
                load_paths.push(root);

                let mut options = grass::Options::default().style(style);
                for path in &load_paths {
                    options = options.load_path(path);
                }
                let css = grass::from_string(source, &options).map_err(|e| anyhow!("{e}"))?;
                fs.write(&output, css.as_bytes())?;
                Ok((output, files.len()))
            })
            .await;

            match bundled {
                Ok(Ok((output, count))) => {
                    debug!(files = count, output = ?output, "bundled stylesheets");
                    TransformOutcome::Written(output)
                }
                Ok(Err(err)) => TransformOutcome::Failed(err.into()),
                Err(join_err) => {
                    TransformOutcome::failed(format!("stylesheet compiler panicked: {join_err}"))
                }
            }
        })
    }
}
