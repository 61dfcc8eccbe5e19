// src/transform/builtin.rs

//! Instantiates the transform named by `transform = "..."` in a task section.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{EnvSelection, ManifestSection, TaskConfig};
use crate::errors::Result;
use crate::transform::clean::CleanTransform;
use crate::transform::command::CommandTransform;
use crate::transform::copy::CopyTransform;
use crate::transform::env_config::EnvConfigTransform;
use crate::transform::manifest::{FieldSuffix, ManifestTransform};
use crate::transform::sass::{SassBundleTransform, SassTransform};
use crate::transform::template::TemplateTransform;
use crate::transform::{InputPatterns, OutputLayout, Transform};
use crate::types::TransformKind;

/// Build the transform for a validated task section.
///
/// Returns `None` for aggregate tasks.
pub fn instantiate(
    name: &str,
    task: &TaskConfig,
    manifest: &ManifestSection,
    env: &EnvSelection,
) -> Result<Option<Arc<dyn Transform>>> {
    let Some(kind) = task.transform else {
        return Ok(None);
    };
    let layout = OutputLayout {
        subdir: task.dest.clone(),
        extension: task.extension.clone(),
    };

    let transform: Arc<dyn Transform> = match kind {
        TransformKind::Copy => Arc::new(CopyTransform::new(layout, task.effective_overwrite())),
        TransformKind::Sass => match &task.bundle {
            Some(bundle) => {
                let output: PathBuf = layout.subdir.iter().chain([bundle]).collect();
                let patterns = InputPatterns::new(name, &task.inputs, &task.exclude)?;
                Arc::new(SassBundleTransform::new(patterns, output, task.style))
            }
            None => Arc::new(SassTransform::new(layout, task.style)),
        },
        TransformKind::Template => Arc::new(TemplateTransform::new(layout)),
        TransformKind::Command => Arc::new(CommandTransform::new(
            layout,
            task.cmd.clone().unwrap_or_default(),
        )),
        TransformKind::Env => Arc::new(EnvConfigTransform::new(env.config_path.clone())),
        TransformKind::Manifest => {
            let mut t = ManifestTransform::new(layout);
            if !manifest.suffix.is_empty() {
                t = t.with_rewriter(Arc::new(FieldSuffix::new(manifest.suffix.clone())));
            }
            Arc::new(t)
        }
        TransformKind::Clean => Arc::new(CleanTransform),
    };

    Ok(Some(transform))
}
