// src/exec/mod.rs

//! Execution layer.
//!
//! - [`runner`] executes an [`ExecutionPlan`](crate::dag::ExecutionPlan)
//!   stage by stage and returns a [`RunReport`].
//! - [`report`] holds the task and run reports.
//! - [`backend`] provides the `RunnerBackend` trait the runtime uses, and
//!   the `RealRunnerBackend` used in production.

pub mod backend;
pub mod report;
pub mod runner;

pub use backend::{RealRunnerBackend, RunnerBackend};
pub use report::{FileFailure, RunReport, TaskReport};
pub use runner::{RunnerOptions, TaskRunner};
