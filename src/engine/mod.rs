// src/engine/mod.rs

//! Incremental scheduler.
//!
//! This module ties together:
//! - the task graph and the transform registry (what a batch impacts)
//! - the pending-change accumulator (batches that arrive during a run)
//! - the main runtime event loop that reacts to:
//!   - sealed change batches
//!   - run completions
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::dag::ExecutionPlan;
use crate::exec::RunReport;
use crate::watch::ChangeBatch;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Monotonically increasing run identifier.
pub type RunId = u64;

/// Why a run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunReason {
    /// The startup full build.
    Initial,
    /// Source changes.
    Changes,
    /// Changes that arrived while the previous run was active.
    FollowUp,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once idle with nothing pending (used by `build`).
    pub exit_when_idle: bool,
}

/// Scheduler state owned by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    RunningWithPendingChanges,
}

/// A run the core asks the shell to start.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub run_id: RunId,
    pub plan: ExecutionPlan,
    pub reason: RunReason,
}

/// Events flowing into the runtime from the aggregator, the runner, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// The aggregator sealed a batch of changes.
    ChangesSealed(ChangeBatch),
    /// Run the whole plan (startup).
    FullBuildRequested,
    /// A run finished (successfully or not).
    RunCompleted { run_id: RunId, report: RunReport },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod pending;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use pending::PendingChanges;
pub use runtime::Runtime;
