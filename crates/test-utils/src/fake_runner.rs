use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use buildwatch::dag::ExecutionPlan;
use buildwatch::engine::{RunRequest, RuntimeEvent};
use buildwatch::errors::{Result, TransformError};
use buildwatch::exec::{FileFailure, RunReport, RunnerBackend, TaskReport};

/// A fake runner backend that:
/// - records every requested run
/// - in auto mode, immediately reports `RunCompleted` with a synthetic
///   report (tasks in `failing` fail with one file each)
/// - in manual mode, only records; the test sends completions itself.
pub struct FakeRunnerBackend {
    runtime_tx: Option<mpsc::Sender<RuntimeEvent>>,
    requests: Arc<Mutex<Vec<RunRequest>>>,
    failing: BTreeSet<String>,
}

impl FakeRunnerBackend {
    pub fn auto(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        requests: Arc<Mutex<Vec<RunRequest>>>,
    ) -> Self {
        Self {
            runtime_tx: Some(runtime_tx),
            requests,
            failing: BTreeSet::new(),
        }
    }

    pub fn manual(requests: Arc<Mutex<Vec<RunRequest>>>) -> Self {
        Self {
            runtime_tx: None,
            requests,
            failing: BTreeSet::new(),
        }
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }
}

impl RunnerBackend for FakeRunnerBackend {
    fn start_run(
        &mut self,
        request: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let requests = Arc::clone(&self.requests);
        let report = fake_report(&request.plan, &self.failing);

        Box::pin(async move {
            let run_id = request.run_id;
            requests.lock().unwrap().push(request);

            if let Some(tx) = tx {
                tx.send(RuntimeEvent::RunCompleted { run_id, report })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}

/// Report for `plan` as the real runner would produce it if every task in
/// `failing` failed one file: later stages are skipped after a failure.
pub fn fake_report(plan: &ExecutionPlan, failing: &BTreeSet<String>) -> RunReport {
    let mut report = RunReport::default();
    let stages = plan.stages();
    for (idx, stage) in stages.iter().enumerate() {
        let mut failed = false;
        for task in stage {
            let mut tr = TaskReport::new(task.clone());
            tr.files_processed = 1;
            if failing.contains(task) {
                failed = true;
                tr.files_failed.push(FileFailure {
                    path: format!("{task}.in").into(),
                    error: TransformError::new("fake failure"),
                });
            } else {
                tr.files_written = 1;
            }
            report.tasks.push(tr);
        }
        if failed {
            report.halted_at_stage = Some(idx);
            report.skipped = stages[idx + 1..].iter().flatten().cloned().collect();
            break;
        }
    }
    report
}

/// Successful report listing `tasks`, for manual completions.
pub fn success_report(plan: &ExecutionPlan) -> RunReport {
    fake_report(plan, &BTreeSet::new())
}
