// src/exec/report.rs

//! Run and task reports produced by the runner.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::engine::TaskName;
use crate::errors::{BuildError, TransformError};

/// One failed input of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: TransformError,
}

/// Outcome of one task invocation.
#[derive(Debug, Clone, Default)]
pub struct TaskReport {
    pub task: TaskName,
    pub files_processed: usize,
    pub files_written: usize,
    pub files_skipped: usize,
    /// Failed inputs, in input order.
    pub files_failed: Vec<FileFailure>,
    pub duration: Duration,
    /// Task-level failure (e.g. input enumeration failed).
    pub error: Option<String>,
}

impl TaskReport {
    pub fn new(task: impl Into<TaskName>) -> Self {
        Self {
            task: task.into(),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.files_failed.is_empty()
    }
}

/// Outcome of executing a plan.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Task reports in execution order.
    pub tasks: Vec<TaskReport>,
    /// Index of the stage after which the run stopped because of a failure.
    pub halted_at_stage: Option<usize>,
    /// Tasks of stages that never started.
    pub skipped: Vec<TaskName>,
    /// The run was cut short by a shutdown request.
    pub cancelled: bool,
    pub duration: Duration,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.halted_at_stage.is_none() && self.tasks.iter().all(TaskReport::is_success)
    }

    pub fn failed_tasks(&self) -> Vec<TaskName> {
        self.tasks
            .iter()
            .filter(|t| !t.is_success())
            .map(|t| t.task.clone())
            .collect()
    }

    /// Every failed file, paired with its task.
    pub fn failed_files(&self) -> impl Iterator<Item = (&str, &FileFailure)> {
        self.tasks
            .iter()
            .flat_map(|t| t.files_failed.iter().map(move |f| (t.task.as_str(), f)))
    }

    /// Failed files, counting a task-level error as one failure.
    pub fn failed_file_count(&self) -> usize {
        self.tasks
            .iter()
            .map(|t| t.files_failed.len() + usize::from(t.error.is_some()))
            .sum()
    }

    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.task == name)
    }

    /// Names of the tasks that were invoked, in execution order.
    pub fn executed(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.task.as_str()).collect()
    }

    /// Log a summary of the run at the appropriate level.
    pub fn log_summary(&self, run_id: u64) {
        for task in &self.tasks {
            for failure in &task.files_failed {
                error!(
                    run_id,
                    task = %task.task,
                    path = ?failure.path,
                    error = %failure.error,
                    "file failed"
                );
            }
            if let Some(err) = &task.error {
                error!(run_id, task = %task.task, error = %err, "task failed");
            }
        }

        let written: usize = self.tasks.iter().map(|t| t.files_written).sum();
        if self.cancelled {
            warn!(
                run_id,
                skipped = ?self.skipped,
                "run cancelled"
            );
        } else if self.is_success() {
            info!(
                run_id,
                tasks = self.tasks.len(),
                files_written = written,
                duration_ms = self.duration.as_millis() as u64,
                "run finished"
            );
        } else {
            error!(
                run_id,
                failed_tasks = ?self.failed_tasks(),
                failed_files = self.failed_file_count(),
                halted_at_stage = ?self.halted_at_stage,
                skipped = ?self.skipped,
                "run failed"
            );
        }
    }

    /// `Ok(self)` when the run succeeded, `BatchFailed` otherwise.
    pub fn into_result(self) -> Result<Self, BuildError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BuildError::BatchFailed {
                failed_files: self.failed_file_count(),
                tasks: self.failed_tasks(),
            })
        }
    }
}
