// src/config/validate.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::errors::{BuildError, Result};
use crate::watch::path_utils::{lexical_normalize, paths_nest};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.project, raw.manifest, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_project(cfg)?;
    for (name, task) in cfg.task.iter() {
        validate_task(name, task)?;
    }
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(BuildError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_project(cfg: &RawConfigFile) -> Result<()> {
    let project = &cfg.project;

    if project.debounce_ms == 0 {
        return Err(BuildError::ConfigError(
            "[project].debounce_ms must be > 0 (got 0)".to_string(),
        ));
    }

    if project.max_parallel_files == 0 {
        return Err(BuildError::ConfigError(
            "[project].max_parallel_files must be >= 1 (got 0)".to_string(),
        ));
    }

    if project.source.trim().is_empty() || project.dest.trim().is_empty() {
        return Err(BuildError::ConfigError(
            "[project].source and [project].dest must not be empty".to_string(),
        ));
    }

    let source = lexical_normalize(Path::new(project.source.trim()));
    let dest = lexical_normalize(Path::new(project.dest.trim()));
    if source == dest {
        return Err(BuildError::ConfigError(format!(
            "[project].source and [project].dest must differ (both are '{}')",
            project.source
        )));
    }

    // Nested roots feed build output back in as source.
    if paths_nest(&source, &dest) {
        return Err(BuildError::ConfigError(format!(
            "[project].source '{}' and [project].dest '{}' must not contain each other",
            project.source, project.dest
        )));
    }

    Ok(())
}

fn validate_task(name: &str, task: &TaskConfig) -> Result<()> {
    let Some(kind) = task.transform else {
        if !task.inputs.is_empty() {
            return Err(BuildError::ConfigError(format!(
                "task '{}' has no transform and cannot take `inputs`",
                name
            )));
        }
        return Ok(());
    };

    if kind.needs_inputs() && task.inputs.is_empty() {
        return Err(BuildError::ConfigError(format!(
            "task '{}' uses transform '{}' and needs at least one pattern in `inputs`",
            name, kind
        )));
    }

    if !kind.needs_inputs() && !task.inputs.is_empty() {
        return Err(BuildError::ConfigError(format!(
            "task '{}' uses transform '{}', which does not take `inputs`",
            name, kind
        )));
    }

    if task.bundle.is_some() && kind != crate::types::TransformKind::Sass {
        return Err(BuildError::ConfigError(format!(
            "task '{}' sets `bundle`, which only applies to transform 'sass'",
            name
        )));
    }

    if task.bundle.as_deref().is_some_and(|b| b.trim().is_empty()) {
        return Err(BuildError::ConfigError(format!(
            "task '{}' has an empty `bundle` path",
            name
        )));
    }

    if kind == crate::types::TransformKind::Command
        && task.cmd.as_deref().is_none_or(|c| c.trim().is_empty())
    {
        return Err(BuildError::ConfigError(format!(
            "task '{}' uses transform 'command' but has no `cmd`",
            name
        )));
    }

    Ok(())
}
