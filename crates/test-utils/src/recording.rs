use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use buildwatch::transform::{
    Transform, TransformContext, TransformFuture, TransformOutcome,
};

/// Shared log of `(task, input)` invocations, in call order.
pub type CallLog = Arc<Mutex<Vec<(String, PathBuf)>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Names of the tasks in `log`, in first-call order, deduplicated.
pub fn tasks_in_order(log: &CallLog) -> Vec<String> {
    let mut seen = BTreeSet::new();
    log.lock()
        .unwrap()
        .iter()
        .filter(|(task, _)| seen.insert(task.clone()))
        .map(|(task, _)| task.clone())
        .collect()
}

/// Transform that records its inputs and writes `"<task>:<rel>"` to
/// `<dest>/<task>/<rel>`.
///
/// Inputs whose relative path is listed in `fail_on` fail instead.
#[derive(Debug)]
pub struct RecordingTransform {
    task: String,
    log: CallLog,
    fail_on: BTreeSet<String>,
    delay: Option<Duration>,
}

impl RecordingTransform {
    pub fn new(task: &str, log: CallLog) -> Self {
        Self {
            task: task.to_string(),
            log,
            fail_on: BTreeSet::new(),
            delay: None,
        }
    }

    pub fn fail_on(mut self, rel: &str) -> Self {
        self.fail_on.insert(rel.to_string());
        self
    }

    /// Sleep before doing the work (tokio time, so paused clocks apply).
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn shared(self) -> Arc<dyn Transform> {
        Arc::new(self)
    }
}

impl Transform for RecordingTransform {
    fn kind(&self) -> &str {
        "recording"
    }

    fn apply<'a>(&'a self, ctx: &'a TransformContext, input: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            self.log
                .lock()
                .unwrap()
                .push((self.task.clone(), input.to_path_buf()));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let rel = ctx.relative(input).unwrap_or_default();
            if self.fail_on.contains(&rel) {
                return TransformOutcome::failed(format!("refusing {rel}"));
            }

            let out = if rel.is_empty() {
                ctx.dest_root.join(&self.task)
            } else {
                ctx.dest_root.join(&self.task).join(&rel)
            };
            let body = format!("{}:{}", self.task, rel);
            ctx.fs.write(&out, body.as_bytes()).map(|()| out).into()
        })
    }
}
