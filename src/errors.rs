// src/errors.rs

//! Crate-wide error types.
//!
//! Graph and configuration problems are fatal and surface as [`BuildError`].
//! Per-file transform failures are *not* errors at this level: they are
//! recorded as [`TransformError`]s inside a run report.

use thiserror::Error;

use crate::engine::TaskName;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("task '{0}' is declared more than once")]
    DuplicateTask(TaskName),

    #[error("task '{task}' has unknown prerequisite '{prerequisite}'")]
    UnknownPrerequisite {
        task: TaskName,
        prerequisite: TaskName,
    },

    #[error("Task not found: {0}")]
    UnknownTask(TaskName),

    #[error("cycle detected between tasks: {}", .0.join(", "))]
    CycleDetected(Vec<TaskName>),

    #[error("invalid glob pattern '{pattern}' for task '{task}': {source}")]
    InvalidGlob {
        task: TaskName,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{failed_files} file(s) failed in task(s): {}", .tasks.join(", "))]
    BatchFailed {
        failed_files: usize,
        tasks: Vec<TaskName>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single transform invocation.
///
/// Carried inside `TransformOutcome::Failed` and copied into the task report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for TransformError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line.
        Self::new(format!("{err:#}"))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildError>;
