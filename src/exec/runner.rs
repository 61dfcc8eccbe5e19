// src/exec/runner.rs

//! Stage-by-stage plan execution.
//!
//! Tasks of a stage run concurrently (or in stage order when
//! `parallel_tasks` is off); files of a task run concurrently, bounded by a
//! semaphore. The runner holds no state between runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::dag::ExecutionPlan;
use crate::engine::TaskName;
use crate::errors::TransformError;
use crate::exec::report::{FileFailure, RunReport, TaskReport};
use crate::shutdown::Shutdown;
use crate::transform::{TransformContext, TransformOutcome, TransformRegistry};

/// Concurrency knobs for [`TaskRunner`].
#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    pub parallel_tasks: bool,
    pub max_parallel_files: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            parallel_tasks: true,
            max_parallel_files: 8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskRunner {
    registry: Arc<TransformRegistry>,
    ctx: Arc<TransformContext>,
    options: RunnerOptions,
}

impl TaskRunner {
    pub fn new(
        registry: Arc<TransformRegistry>,
        ctx: Arc<TransformContext>,
        options: RunnerOptions,
    ) -> Self {
        Self {
            registry,
            ctx,
            options: RunnerOptions {
                max_parallel_files: options.max_parallel_files.max(1),
                ..options
            },
        }
    }

    pub fn context(&self) -> &TransformContext {
        &self.ctx
    }

    /// Execute `plan`.
    ///
    /// `shutdown` is checked before each stage; once set, the remaining
    /// stages are skipped and the report is marked cancelled. After a stage
    /// with a failed task the remaining stages are skipped as well.
    pub async fn run(&self, plan: &ExecutionPlan, shutdown: &Shutdown) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::default();

        info!(
            stages = plan.len(),
            tasks = plan.task_count(),
            "starting run"
        );

        let stages = plan.stages();
        for (idx, stage) in stages.iter().enumerate() {
            if shutdown.is_triggered() {
                warn!(stage = idx, "shutdown requested; skipping remaining stages");
                report.cancelled = true;
                report.skipped = stages[idx..].iter().flatten().cloned().collect();
                break;
            }

            let reports = self
                .run_stage(stage)
                .instrument(info_span!("stage", idx))
                .await;
            let failed = reports.iter().any(|r| !r.is_success());
            report.tasks.extend(reports);

            if failed {
                report.halted_at_stage = Some(idx);
                report.skipped = stages[idx + 1..].iter().flatten().cloned().collect();
                if !report.skipped.is_empty() {
                    warn!(
                        stage = idx,
                        skipped = ?report.skipped,
                        "stage failed; skipping later stages"
                    );
                }
                break;
            }
        }

        report.duration = started.elapsed();
        report
    }

    /// Run the tasks of one stage. Reports are returned in stage order.
    async fn run_stage(&self, stage: &[TaskName]) -> Vec<TaskReport> {
        debug!(tasks = ?stage, "starting stage");

        if !self.options.parallel_tasks || stage.len() == 1 {
            let mut out = Vec::with_capacity(stage.len());
            for name in stage {
                out.push(self.run_task(name).await);
            }
            return out;
        }

        let mut join_set = JoinSet::new();
        for (idx, name) in stage.iter().enumerate() {
            let runner = self.clone();
            let name = name.clone();
            join_set.spawn(async move { (idx, runner.run_task(&name).await) });
        }

        let mut slots: Vec<Option<TaskReport>> = vec![None; stage.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, report)) => slots[idx] = Some(report),
                Err(err) => warn!(error = %err, "task worker panicked"),
            }
        }

        slots
            .into_iter()
            .zip(stage)
            .map(|(slot, name)| {
                slot.unwrap_or_else(|| TaskReport {
                    error: Some("task worker panicked".to_string()),
                    ..TaskReport::new(name.clone())
                })
            })
            .collect()
    }

    /// Run a single task over all of its inputs, ignoring prerequisites.
    pub async fn run_task(&self, name: &str) -> TaskReport {
        let started = Instant::now();
        let mut report = TaskReport::new(name);

        let registered = match self.registry.resolve(name) {
            Ok(t) => t,
            Err(err) => {
                report.error = Some(err.to_string());
                return report;
            }
        };

        let Some(transform) = registered.transform().cloned() else {
            debug!(task = %name, "aggregate task; nothing to do");
            report.duration = started.elapsed();
            return report;
        };

        let inputs = if registered.patterns().is_empty() || transform.once_per_run() {
            vec![self.ctx.source_root.clone()]
        } else {
            let fs = Arc::clone(&self.ctx.fs);
            let root = self.ctx.source_root.clone();
            let patterns = registered.patterns().clone();
            let listed =
                tokio::task::spawn_blocking(move || crate::fs::list(fs.as_ref(), &root, &patterns))
                    .await;
            match listed {
                Ok(Ok(files)) => files,
                Ok(Err(err)) => {
                    report.error = Some(format!("enumerating inputs: {err:#}"));
                    report.duration = started.elapsed();
                    return report;
                }
                Err(err) => {
                    report.error = Some(format!("enumerating inputs: {err}"));
                    report.duration = started.elapsed();
                    return report;
                }
            }
        };

        info!(
            task = %name,
            transform = transform.kind(),
            files = inputs.len(),
            "running task"
        );

        let semaphore = Arc::new(Semaphore::new(self.options.max_parallel_files));
        let mut join_set = JoinSet::new();
        for (idx, input) in inputs.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let transform = Arc::clone(&transform);
            let ctx = Arc::clone(&self.ctx);
            join_set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => transform.apply(&ctx, &input).await,
                    Err(_) => TransformOutcome::failed("file worker pool closed"),
                };
                (idx, outcome)
            });
        }

        let mut outcomes: Vec<Option<TransformOutcome>> = vec![None; inputs.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, outcome)) => outcomes[idx] = Some(outcome),
                Err(err) => warn!(task = %name, error = %err, "file worker panicked"),
            }
        }

        for (input, outcome) in inputs.into_iter().zip(outcomes) {
            report.files_processed += 1;
            record_outcome(&mut report, input, outcome);
        }

        report.duration = started.elapsed();
        info!(
            task = %name,
            written = report.files_written,
            skipped = report.files_skipped,
            failed = report.files_failed.len(),
            duration_ms = report.duration.as_millis() as u64,
            "task finished"
        );
        report
    }
}

fn record_outcome(report: &mut TaskReport, input: PathBuf, outcome: Option<TransformOutcome>) {
    match outcome {
        Some(TransformOutcome::Written(output)) => {
            debug!(task = %report.task, input = ?input, output = ?output, "written");
            report.files_written += 1;
        }
        Some(TransformOutcome::Skipped(reason)) => {
            debug!(task = %report.task, input = ?input, %reason, "skipped");
            report.files_skipped += 1;
        }
        Some(TransformOutcome::Failed(error)) => {
            report.files_failed.push(FileFailure { path: input, error });
        }
        None => {
            report.files_failed.push(FileFailure {
                path: input,
                error: TransformError::new("transform panicked"),
            });
        }
    }
}
