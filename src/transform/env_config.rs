// src/transform/env_config.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::transform::{Transform, TransformContext, TransformFuture, blocking_fs};

/// File name of the environment config inside the destination tree.
pub const ENV_OUTPUT_FILE: &str = "env.json";

/// Copies the selected environment config verbatim to `<dest>/env.json`.
///
/// Invoked once per run; the input path handed in by the runner is ignored.
#[derive(Debug, Clone)]
pub struct EnvConfigTransform {
    config_path: PathBuf,
}

impl EnvConfigTransform {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl Transform for EnvConfigTransform {
    fn kind(&self) -> &str {
        "env"
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, _input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            let output = ctx.dest_root.join(ENV_OUTPUT_FILE);
            info!(
                env = %ctx.env_name,
                config = ?self.config_path,
                "writing environment config"
            );
            let fs = Arc::clone(&ctx.fs);
            let config_path = self.config_path.clone();
            let env_name = ctx.env_name.clone();
            blocking_fs(move || {
                fs.read(&config_path)
                    .with_context(|| format!("environment '{}' has no usable config", env_name))
                    .and_then(|bytes| fs.write(&output, &bytes))
                    .map(|()| output)
                    .into()
            })
            .await
        })
    }
}
