// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::RunnerBackend;
use crate::shutdown::ShutdownTrigger;

use super::core::CoreRuntime;
use super::{CoreCommand, RunRequest, RuntimeEvent};

/// Drives the incremental scheduler in response to `RuntimeEvent`s, and
/// delegates run execution to a `RunnerBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// scheduling semantics.
pub struct Runtime<B: RunnerBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    cancel: ShutdownTrigger,
}

impl<B: RunnerBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: RunnerBackend> Runtime<B> {
    /// `cancel` is fired when the core asks to cancel the in-flight run; the
    /// backend's runner must observe the matching `Shutdown`.
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        backend: B,
        cancel: ShutdownTrigger,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            cancel,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes the commands returned by the core.
    ///
    /// Returns the core so callers can inspect its final state.
    pub async fn run(mut self) -> Result<CoreRuntime> {
        info!("buildwatch runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(event = event_label(&event), "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(self.core)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::StartRun(request) => self.start_run(request).await?,
            CoreCommand::CancelRun(run_id) => {
                debug!(run_id, "signalling cancellation");
                self.cancel.trigger();
            }
            CoreCommand::RequestExit => {
                // keep_running is already false; nothing else to do.
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn start_run(&mut self, request: RunRequest) -> Result<()> {
        debug!(
            run_id = request.run_id,
            reason = ?request.reason,
            plan = %request.plan,
            "dispatching run"
        );
        self.backend.start_run(request).await
    }
}

fn event_label(event: &RuntimeEvent) -> &'static str {
    match event {
        RuntimeEvent::ChangesSealed(_) => "changes_sealed",
        RuntimeEvent::FullBuildRequested => "full_build_requested",
        RuntimeEvent::RunCompleted { .. } => "run_completed",
        RuntimeEvent::ShutdownRequested => "shutdown_requested",
    }
}
