// src/config/mod.rs

//! Project file loading and validation.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: read a project file from disk.
//! - `validate.rs`: `RawConfigFile` → `ConfigFile` checks.
//! - `env.rs`: environment name and env config file selection.

pub mod env;
pub mod loader;
pub mod model;
pub mod validate;

pub use env::EnvSelection;
pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, ManifestSection, ProjectSection, RawConfigFile, TaskConfig};
