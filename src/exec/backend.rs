// src/exec/backend.rs

//! Pluggable runner backend abstraction.
//!
//! The runtime talks to a `RunnerBackend` instead of a [`TaskRunner`]
//! directly, so tests can swap in a fake backend that records requested
//! runs and answers with canned reports.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::{debug, info_span, Instrument};

use crate::engine::{RunRequest, RuntimeEvent};
use crate::errors::Result;
use crate::exec::runner::TaskRunner;
use crate::shutdown::Shutdown;

/// How planned runs are executed.
pub trait RunnerBackend: Send {
    /// Start `request` in the background. The backend must eventually send
    /// `RuntimeEvent::RunCompleted` carrying `request.run_id`.
    fn start_run(
        &mut self,
        request: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production backend: each run is a tokio task driving a [`TaskRunner`].
pub struct RealRunnerBackend {
    runner: TaskRunner,
    shutdown: Shutdown,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl RealRunnerBackend {
    pub fn new(
        runner: TaskRunner,
        shutdown: Shutdown,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            runner,
            shutdown,
            runtime_tx,
        }
    }
}

impl RunnerBackend for RealRunnerBackend {
    fn start_run(
        &mut self,
        request: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let runner = self.runner.clone();
        let shutdown = self.shutdown.clone();
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            let run_id = request.run_id;
            tokio::spawn(
                async move {
                    let report = runner.run(&request.plan, &shutdown).await;
                    if tx
                        .send(RuntimeEvent::RunCompleted { run_id, report })
                        .await
                        .is_err()
                    {
                        debug!(run_id, "runtime gone before run completed");
                    }
                }
                .instrument(info_span!("run", run_id)),
            );
            Ok(())
        })
    }
}
