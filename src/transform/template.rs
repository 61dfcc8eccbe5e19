// src/transform/template.rs

use std::path::Path;

use minijinja::{Environment, context, path_loader};
use tracing::debug;

use crate::transform::{
    OutputLayout, Transform, TransformContext, TransformFuture, TransformOutcome, is_partial,
};

/// Renders view templates with `minijinja`.
///
/// `{% include %}` / `{% extends %}` names are resolved from the source root.
/// Every template sees `env` (the selected environment name) and `path` (its
/// own path relative to the source root).
#[derive(Debug, Clone)]
pub struct TemplateTransform {
    layout: OutputLayout,
}

impl TemplateTransform {
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout: layout.with_extension("html"),
        }
    }
}

impl Transform for TemplateTransform {
    fn kind(&self) -> &str {
        "template"
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            if is_partial(input) {
                return TransformOutcome::Skipped("partial".to_string());
            }

            let (Some(rel), Some(output)) = (ctx.relative(input), self.layout.output_for(ctx, input))
            else {
                return TransformOutcome::failed(format!(
                    "input {:?} is outside the source root",
                    input
                ));
            };

            let source = match ctx.fs.read_to_string(input) {
                Ok(s) => s,
                Err(err) => return TransformOutcome::Failed(err.into()),
            };

            let root = ctx.source_root.clone();
            let env_name = ctx.env_name.clone();
            let rendered = tokio::task::spawn_blocking(move || {
                let mut env = Environment::new();
                env.set_loader(path_loader(root));
                env.render_str(&source, context! { env => env_name, path => rel })
                    .map_err(|e| format!("{e:#}"))
            })
            .await;

            match rendered {
                Ok(Ok(html)) => {
                    debug!(input = ?input, output = ?output, "rendered template");
                    ctx.fs.write(&output, html.as_bytes()).map(|()| output).into()
                }
                Ok(Err(msg)) => TransformOutcome::failed(msg),
                Err(join_err) => {
                    TransformOutcome::failed(format!("template renderer panicked: {join_err}"))
                }
            }
        })
    }
}
