// src/transform/registry.rs

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::engine::TaskName;
use crate::errors::{BuildError, Result};
use crate::transform::patterns::InputPatterns;
use crate::transform::Transform;

/// A task as known to the registry: its compiled globs and its transform.
///
/// `transform` is `None` for aggregate tasks (e.g. `build`) that only exist
/// to group prerequisites.
#[derive(Debug, Clone)]
pub struct RegisteredTask {
    name: TaskName,
    patterns: InputPatterns,
    transform: Option<Arc<dyn Transform>>,
}

impl RegisteredTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &InputPatterns {
        &self.patterns
    }

    pub fn transform(&self) -> Option<&Arc<dyn Transform>> {
        self.transform.as_ref()
    }
}

/// Maps task names to transforms and input globs.
///
/// Filled once while the project is assembled and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    tasks: BTreeMap<TaskName, RegisteredTask>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<TaskName>,
        inputs: &[String],
        exclude: &[String],
        transform: Option<Arc<dyn Transform>>,
    ) -> Result<()> {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(BuildError::DuplicateTask(name));
        }

        let patterns = InputPatterns::new(&name, inputs, exclude)?;
        debug!(
            task = %name,
            transform = transform.as_ref().map(|t| t.kind()).unwrap_or("none"),
            inputs = ?patterns.include(),
            "registered transform"
        );

        self.tasks.insert(
            name.clone(),
            RegisteredTask {
                name,
                patterns,
                transform,
            },
        );
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&RegisteredTask> {
        self.tasks
            .get(name)
            .ok_or_else(|| BuildError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Every task whose input globs match `rel_path` (relative to the source
    /// root, forward slashes). Pure pattern evaluation, no IO.
    pub fn match_path(&self, rel_path: &str) -> BTreeSet<TaskName> {
        self.tasks
            .values()
            .filter(|t| t.patterns.matches(rel_path))
            .map(|t| t.name.clone())
            .collect()
    }

    /// Union of [`match_path`](Self::match_path) over several paths.
    pub fn match_paths<'p, I>(&self, rel_paths: I) -> BTreeSet<TaskName>
    where
        I: IntoIterator<Item = &'p str>,
    {
        let mut out = BTreeSet::new();
        for rel in rel_paths {
            out.extend(self.match_path(rel));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
