// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated scheduler state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, starting runs on the backend and handling
//! cancellation.
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! processes.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::dag::{ExecutionPlan, TaskGraph};
use crate::engine::event_handlers::{
    CoreStep, handle_changes, handle_run_completed, handle_shutdown,
};
use crate::engine::pending::PendingChanges;
use crate::engine::{RunId, RuntimeEvent, RuntimeOptions, SchedulerState, TaskName};
use crate::transform::TransformRegistry;
use crate::watch::ChangeBatch;
use crate::watch::path_utils::relative_str;

/// Pure core runtime state.
///
/// This owns:
/// - the scheduler state and the active run id
/// - the pending-change accumulator
/// - runtime options (e.g. `exit_when_idle`)
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    pub(super) graph: Arc<TaskGraph>,
    pub(super) registry: Arc<TransformRegistry>,
    pub(super) source_root: PathBuf,
    pub(super) state: SchedulerState,
    pub(super) pending: PendingChanges,
    pub(super) next_run_id: RunId,
    pub(super) active_run: Option<RunId>,
    pub(super) options: RuntimeOptions,
    pub(super) shutting_down: bool,
}

impl CoreRuntime {
    pub fn new(
        graph: Arc<TaskGraph>,
        registry: Arc<TransformRegistry>,
        source_root: impl Into<PathBuf>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            graph,
            registry,
            source_root: source_root.into(),
            state: SchedulerState::Idle,
            pending: PendingChanges::new(),
            next_run_id: 1,
            active_run: None,
            options,
            shutting_down: false,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SchedulerState::Idle
    }

    /// Expose pending-accumulator emptiness (for tests).
    pub fn pending_is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active_run
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::ChangesSealed(batch) => {
                let (paths, full) = self.relative_paths(&batch);
                handle_changes(self, paths, full)
            }
            RuntimeEvent::FullBuildRequested => handle_changes(self, BTreeSet::new(), true),
            RuntimeEvent::RunCompleted { run_id, report } => {
                handle_run_completed(self, run_id, &report)
            }
            RuntimeEvent::ShutdownRequested => handle_shutdown(self),
        }
    }

    /// Tasks impacted by `rel_paths`: the matched tasks plus their
    /// transitive dependents. `full` impacts every task.
    pub fn impacted_tasks(&self, rel_paths: &BTreeSet<String>, full: bool) -> BTreeSet<TaskName> {
        if full {
            return self.graph.tasks().map(str::to_string).collect();
        }
        let matched = self
            .registry
            .match_paths(rel_paths.iter().map(String::as_str));
        self.graph.with_dependents(matched.iter().map(String::as_str))
    }

    pub(super) fn plan_for(&self, tasks: &BTreeSet<TaskName>, full: bool) -> ExecutionPlan {
        if full {
            self.graph.plan().clone()
        } else {
            self.graph.subplan(tasks)
        }
    }

    /// Paths of `batch` relative to the source root; paths outside it are
    /// dropped.
    fn relative_paths(&self, batch: &ChangeBatch) -> (BTreeSet<String>, bool) {
        let paths = batch
            .paths()
            .filter_map(|p| relative_str(&self.source_root, p))
            .collect();
        (paths, batch.is_full())
    }
}
