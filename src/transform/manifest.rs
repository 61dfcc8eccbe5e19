// src/transform/manifest.rs

//! Package manifest passthrough.
//!
//! The manifest is parsed as JSON, handed to each [`ManifestRewriter`] in
//! order and written back pretty-printed. Key order is preserved.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::transform::{
    OutputLayout, Transform, TransformContext, TransformFuture, TransformOutcome, blocking_fs,
};

/// Edits a parsed manifest for a given environment.
pub trait ManifestRewriter: Send + Sync + Debug {
    fn rewrite(&self, manifest: &mut Value, env: &str) -> Result<()>;
}

/// Appends a per-environment suffix to string fields.
///
/// `suffixes[env][field] = suffix`; e.g. `development.name = "-dev"` turns
/// `"name": "shop"` into `"name": "shop-dev"`. Fields that are missing or not
/// strings are left alone.
#[derive(Debug, Clone, Default)]
pub struct FieldSuffix {
    suffixes: BTreeMap<String, BTreeMap<String, String>>,
}

impl FieldSuffix {
    pub fn new(suffixes: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { suffixes }
    }
}

impl ManifestRewriter for FieldSuffix {
    fn rewrite(&self, manifest: &mut Value, env: &str) -> Result<()> {
        let Some(fields) = self.suffixes.get(env) else {
            return Ok(());
        };
        let Some(obj) = manifest.as_object_mut() else {
            anyhow::bail!("manifest is not a JSON object");
        };

        for (field, suffix) in fields {
            if let Some(Value::String(s)) = obj.get_mut(field) {
                s.push_str(suffix);
                debug!(field = %field, value = %s, "rewrote manifest field");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ManifestTransform {
    layout: OutputLayout,
    rewriters: Vec<Arc<dyn ManifestRewriter>>,
}

impl ManifestTransform {
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            rewriters: Vec::new(),
        }
    }

    pub fn with_rewriter(mut self, rewriter: Arc<dyn ManifestRewriter>) -> Self {
        self.rewriters.push(rewriter);
        self
    }

    fn render(&self, raw: &str, env: &str) -> Result<String> {
        let mut manifest: Value = serde_json::from_str(raw).context("parsing manifest")?;
        for rewriter in &self.rewriters {
            rewriter.rewrite(&mut manifest, env)?;
        }
        let mut out = serde_json::to_string_pretty(&manifest).context("serializing manifest")?;
        out.push('\n');
        Ok(out)
    }
}

impl Transform for ManifestTransform {
    fn kind(&self) -> &str {
        "manifest"
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            let Some(output) = self.layout.output_for(ctx, input) else {
                return TransformOutcome::failed(format!(
                    "input {:?} is outside the source root",
                    input
                ));
            };

            let this = self.clone();
            let fs = Arc::clone(&ctx.fs);
            let input = input.to_path_buf();
            let env_name = ctx.env_name.clone();
            blocking_fs(move || {
                fs.read_to_string(&input)
                    .and_then(|raw| this.render(&raw, &env_name))
                    .and_then(|json| fs.write(&output, json.as_bytes()))
                    .map(|()| output)
                    .into()
            })
            .await
        })
    }
}
