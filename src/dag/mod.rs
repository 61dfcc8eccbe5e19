// src/dag/mod.rs

//! Task dependency graph.
//!
//! - [`graph`] validates task declarations and answers closure queries.
//! - [`plan`] holds the staged topological order the runner executes.

pub mod graph;
pub mod plan;

pub use graph::{TaskGraph, TaskGraphBuilder};
pub use plan::ExecutionPlan;
