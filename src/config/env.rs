// src/config/env.rs

//! Environment selection.
//!
//! The environment name comes from `--env`, else `BUILDWATCH_ENV`, else
//! `[project].default_env`. Its config file is `--conf` when given, else
//! `<project>/<env_dir>/env_<name>.json`.

use std::path::{Path, PathBuf};

use crate::config::model::ProjectSection;

/// Environment variable consulted when `--env` is absent.
pub const ENV_VAR: &str = "BUILDWATCH_ENV";

/// The environment a build runs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSelection {
    pub name: String,
    pub config_path: PathBuf,
}

/// Pick the environment name from the CLI value, the environment variable
/// value and the project default, in that order. Blank values are ignored.
pub fn resolve_env_name_from(
    cli: Option<&str>,
    env_value: Option<String>,
    default: &str,
) -> String {
    cli.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            env_value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| default.to_string())
}

/// Resolve the environment for a project rooted at `project_dir`.
pub fn select(
    project_dir: &Path,
    project: &ProjectSection,
    cli_env: Option<&str>,
    cli_conf: Option<&Path>,
) -> EnvSelection {
    let name = resolve_env_name_from(cli_env, std::env::var(ENV_VAR).ok(), &project.default_env);
    let config_path = match cli_conf {
        Some(path) => path.to_path_buf(),
        None => default_env_file(project_dir, &project.env_dir, &name),
    };
    EnvSelection { name, config_path }
}

/// `<project_dir>/<env_dir>/env_<name>.json`
pub fn default_env_file(project_dir: &Path, env_dir: &str, name: &str) -> PathBuf {
    project_dir.join(env_dir).join(format!("env_{name}.json"))
}
