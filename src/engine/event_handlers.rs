// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::engine::core::CoreRuntime;
use crate::engine::{RunId, RunReason, RunRequest, SchedulerState};
use crate::exec::RunReport;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Start this run on the backend.
    StartRun(RunRequest),
    /// Ask the in-flight run to skip its remaining stages.
    CancelRun(RunId),
    /// Request that the process exits.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn proceed(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    fn exit(mut commands: Vec<CoreCommand>) -> Self {
        commands.push(CoreCommand::RequestExit);
        Self {
            commands,
            keep_running: false,
        }
    }
}

/// Handle a sealed batch (or a full build request).
///
/// - Idle: start a run over the impacted tasks, or stay idle if none.
/// - Running: record the paths for a single follow-up run.
pub fn handle_changes(core: &mut CoreRuntime, paths: BTreeSet<String>, full: bool) -> CoreStep {
    if core.shutting_down {
        debug!(paths = paths.len(), "shutting down; ignoring changes");
        return CoreStep::proceed(Vec::new());
    }

    match core.state {
        SchedulerState::Idle => {
            let reason = if full {
                RunReason::Initial
            } else {
                RunReason::Changes
            };
            let commands = start_run_for(core, &paths, full, reason)
                .into_iter()
                .collect();
            CoreStep::proceed(commands)
        }
        SchedulerState::Running | SchedulerState::RunningWithPendingChanges => {
            core.pending.record_batch(paths, full);
            core.state = SchedulerState::RunningWithPendingChanges;
            CoreStep::proceed(Vec::new())
        }
    }
}

/// Handle the completion of a run.
///
/// A completion for anything but the active run is ignored. Otherwise the
/// report is logged and, if changes arrived meanwhile, exactly one follow-up
/// run is started over their union.
pub fn handle_run_completed(core: &mut CoreRuntime, run_id: RunId, report: &RunReport) -> CoreStep {
    if core.active_run != Some(run_id) {
        warn!(
            run_id,
            active_run = ?core.active_run,
            "ignoring completion of a stale run"
        );
        return CoreStep::proceed(Vec::new());
    }

    core.active_run = None;
    core.state = SchedulerState::Idle;
    report.log_summary(run_id);

    if core.shutting_down {
        info!(run_id, "in-flight run finished; exiting");
        return CoreStep::exit(Vec::new());
    }

    if !core.pending.is_empty() {
        let drained = core.pending.drain();
        debug!(
            batches = drained.batches,
            paths = drained.paths.len(),
            full = drained.full,
            "starting follow-up run for pending changes"
        );
        if let Some(cmd) = start_run_for(core, &drained.paths, drained.full, RunReason::FollowUp) {
            return CoreStep::proceed(vec![cmd]);
        }
    }

    if core.options.exit_when_idle {
        return CoreStep::exit(Vec::new());
    }
    CoreStep::proceed(Vec::new())
}

/// Handle a shutdown request.
///
/// Pending changes are dropped. With a run in flight the core asks for it
/// to be cancelled and exits once it completes; otherwise it exits now.
pub fn handle_shutdown(core: &mut CoreRuntime) -> CoreStep {
    core.shutting_down = true;
    let _ = core.pending.drain();

    match core.active_run {
        Some(run_id) => {
            info!(run_id, "shutdown requested; cancelling in-flight run");
            CoreStep::proceed(vec![CoreCommand::CancelRun(run_id)])
        }
        None => {
            info!("shutdown requested while idle");
            CoreStep::exit(Vec::new())
        }
    }
}

/// Compute the impacted plan and, if non-empty, allocate a run id and move
/// to `Running`.
fn start_run_for(
    core: &mut CoreRuntime,
    paths: &BTreeSet<String>,
    full: bool,
    reason: RunReason,
) -> Option<CoreCommand> {
    let impacted = core.impacted_tasks(paths, full);
    if impacted.is_empty() {
        debug!(paths = ?paths, "no task matches the changed paths");
        core.state = SchedulerState::Idle;
        return None;
    }

    let plan = core.plan_for(&impacted, full);
    let run_id = core.next_run_id;
    core.next_run_id += 1;
    core.active_run = Some(run_id);
    core.state = SchedulerState::Running;

    info!(
        run_id,
        ?reason,
        tasks = ?impacted,
        stages = plan.len(),
        "starting run"
    );

    Some(CoreCommand::StartRun(RunRequest {
        run_id,
        plan,
        reason,
    }))
}
