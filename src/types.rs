use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Which builtin transform a task uses (`transform = "..."` in the project file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Copy inputs verbatim into the destination tree.
    Copy,
    /// Compile stylesheets with `grass`.
    Sass,
    /// Render templates with `minijinja`.
    Template,
    /// Run a shell command per input file (lint, transpilers, ...).
    Command,
    /// Write the selected environment config as `env.json`.
    Env,
    /// Copy the package manifest, applying rewriters.
    Manifest,
    /// Empty the destination tree.
    Clean,
}

impl TransformKind {
    /// Whether this transform works per input file and therefore needs
    /// `inputs` patterns.
    pub fn needs_inputs(self) -> bool {
        matches!(
            self,
            TransformKind::Copy
                | TransformKind::Sass
                | TransformKind::Template
                | TransformKind::Command
                | TransformKind::Manifest
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransformKind::Copy => "copy",
            TransformKind::Sass => "sass",
            TransformKind::Template => "template",
            TransformKind::Command => "command",
            TransformKind::Env => "env",
            TransformKind::Manifest => "manifest",
            TransformKind::Clean => "clean",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "copy" => Ok(TransformKind::Copy),
            "sass" | "scss" => Ok(TransformKind::Sass),
            "template" => Ok(TransformKind::Template),
            "command" => Ok(TransformKind::Command),
            "env" => Ok(TransformKind::Env),
            "manifest" => Ok(TransformKind::Manifest),
            "clean" => Ok(TransformKind::Clean),
            other => Err(format!(
                "invalid transform: {other} (expected one of copy, sass, template, command, env, manifest, clean)"
            )),
        }
    }
}

/// Output style for compiled stylesheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SassStyle {
    #[default]
    Expanded,
    Compressed,
}

/// Kind of a raw filesystem change as reported by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        };
        f.write_str(s)
    }
}
