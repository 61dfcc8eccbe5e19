// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{SassStyle, TransformKind};

/// Top-level project file as read from TOML, before validation.
///
/// ```toml
/// [project]
/// source = "app"
/// dest = "build"
///
/// [manifest.suffix.development]
/// name = "-dev"
///
/// [task.sass]
/// transform = "sass"
/// inputs = ["**/*.scss"]
///
/// [task.build]
/// after = ["sass"]
/// ```
///
/// All sections are optional and have reasonable defaults; validation
/// happens in `TryFrom<RawConfigFile> for ConfigFile`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub manifest: ManifestSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated project file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub manifest: ManifestSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    /// Build a `ConfigFile` without validation. Only `TryFrom` calls this.
    pub(crate) fn new_unchecked(
        project: ProjectSection,
        manifest: ManifestSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            project,
            manifest,
            task,
        }
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Source root, relative to the directory of the project file.
    #[serde(default = "default_source")]
    pub source: String,

    /// Output root, relative to the directory of the project file.
    #[serde(default = "default_dest")]
    pub dest: String,

    /// Quiet period after the last file event before a batch is sealed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Upper bound on concurrently processed files within one task.
    #[serde(default = "default_max_parallel_files")]
    pub max_parallel_files: usize,

    /// Run the tasks of a stage concurrently.
    #[serde(default = "default_true")]
    pub parallel_tasks: bool,

    /// Directory holding `env_<name>.json` files.
    #[serde(default = "default_env_dir")]
    pub env_dir: String,

    #[serde(default = "default_env")]
    pub default_env: String,
}

fn default_source() -> String {
    "app".to_string()
}

fn default_dest() -> String {
    "build".to_string()
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_max_parallel_files() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_env_dir() -> String {
    "config".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            dest: default_dest(),
            debounce_ms: default_debounce_ms(),
            max_parallel_files: default_max_parallel_files(),
            parallel_tasks: true,
            env_dir: default_env_dir(),
            default_env: default_env(),
        }
    }
}

/// `[manifest]` section.
///
/// `suffix.<env>.<field> = "<suffix>"` appends a suffix to string fields of
/// the package manifest when building for `<env>`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ManifestSection {
    #[serde(default)]
    pub suffix: BTreeMap<String, BTreeMap<String, String>>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    /// Builtin transform. `None` declares an aggregate task.
    #[serde(default)]
    pub transform: Option<TransformKind>,

    /// Input globs, relative to the source root.
    #[serde(default)]
    pub inputs: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Prerequisites: this task runs in a later stage than all of these.
    #[serde(default)]
    pub after: Vec<String>,

    /// Subdirectory of the output root to write into.
    #[serde(default)]
    pub dest: Option<String>,

    /// Replacement extension for outputs (without the dot).
    #[serde(default)]
    pub extension: Option<String>,

    /// Command line for `transform = "command"`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// For `copy`: replace existing outputs. Defaults to `true`.
    #[serde(default)]
    pub overwrite: Option<bool>,

    /// For `sass`: output style.
    #[serde(default)]
    pub style: SassStyle,

    /// For `sass`: compile all inputs into this one file, relative to the
    /// task's output directory.
    #[serde(default)]
    pub bundle: Option<String>,
}

impl TaskConfig {
    pub fn effective_overwrite(&self) -> bool {
        self.overwrite.unwrap_or(true)
    }
}
