// src/transform/command.rs

use std::path::Path;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::debug;

use crate::transform::{OutputLayout, Transform, TransformContext, TransformFuture, TransformOutcome};

/// Runs a shell command once per input file.
///
/// The command line may reference `{input}`, `{output}`, `{rel}` and `{env}`.
/// A non-zero exit status is a failure carrying the command's stderr. When
/// the command line mentions `{output}`, the parent directory of the output
/// is created beforehand and the output is reported as written.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    layout: OutputLayout,
    cmd: String,
}

impl CommandTransform {
    pub fn new(layout: OutputLayout, cmd: impl Into<String>) -> Self {
        Self {
            layout,
            cmd: cmd.into(),
        }
    }

    fn writes_output(&self) -> bool {
        self.cmd.contains("{output}")
    }
}

/// Substitute the placeholders of a command line.
pub fn expand_placeholders(cmd: &str, input: &Path, output: &Path, rel: &str, env: &str) -> String {
    cmd.replace("{input}", &input.to_string_lossy())
        .replace("{output}", &output.to_string_lossy())
        .replace("{rel}", rel)
        .replace("{env}", env)
}

impl Transform for CommandTransform {
    fn kind(&self) -> &str {
        "command"
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            let (Some(rel), Some(output)) = (ctx.relative(input), self.layout.output_for(ctx, input))
            else {
                return TransformOutcome::failed(format!(
                    "input {:?} is outside the source root",
                    input
                ));
            };

            if self.writes_output() {
                if let Some(parent) = output.parent() {
                    if let Err(err) = ctx.fs.create_dir_all(parent) {
                        return TransformOutcome::Failed(err.into());
                    }
                }
            }

            let line = expand_placeholders(&self.cmd, input, &output, &rel, &ctx.env_name);
            debug!(input = ?input, cmd = %line, "running command");

            let mut cmd = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(&line);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(&line);
                c
            };

            cmd.current_dir(&ctx.source_root)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let result = cmd
                .output()
                .await
                .with_context(|| format!("spawning command for {:?}", input));

            let out = match result {
                Ok(out) => out,
                Err(err) => return TransformOutcome::Failed(err.into()),
            };

            if !out.status.success() {
                let code = out.status.code().unwrap_or(-1);
                let stderr = String::from_utf8_lossy(&out.stderr);
                let stderr = stderr.trim();
                return if stderr.is_empty() {
                    TransformOutcome::failed(format!("command exited with status {code}"))
                } else {
                    TransformOutcome::failed(format!(
                        "command exited with status {code}: {stderr}"
                    ))
                };
            }

            if self.writes_output() {
                TransformOutcome::Written(output)
            } else {
                TransformOutcome::Skipped("command produced no output file".to_string())
            }
        })
    }
}
