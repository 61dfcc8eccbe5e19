// src/watch/mod.rs

//! File watching and change aggregation.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Debouncing raw changes into sealed [`ChangeBatch`]es.
//!
//! It does **not** know about tasks; matching paths to tasks is the
//! scheduler's job.

pub mod aggregator;
pub mod batch;
pub mod path_utils;
pub mod watcher;

pub use aggregator::{ChangeAggregator, DEFAULT_DEBOUNCE};
pub use batch::{ChangeBatch, RawChange};
pub use watcher::{WatchHandle, subscribe};
