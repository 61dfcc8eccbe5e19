// src/dag/plan.rs

use std::collections::BTreeSet;
use std::fmt;

use crate::engine::TaskName;

/// Ordered stages of mutually independent tasks.
///
/// Every prerequisite of a task in stage `i` lies in a stage `< i`; tasks
/// inside a stage are listed in lexical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    stages: Vec<Vec<TaskName>>,
}

impl ExecutionPlan {
    pub fn from_stages(stages: Vec<Vec<TaskName>>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Vec<TaskName>] {
        &self.stages
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    /// Index of the stage containing `task`.
    pub fn stage_of(&self, task: &str) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.iter().any(|t| t == task))
    }

    /// All tasks, stage by stage.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().flatten().map(|s| s.as_str())
    }

    /// Keep only `keep`, dropping stages that become empty.
    pub fn restrict(&self, keep: &BTreeSet<TaskName>) -> ExecutionPlan {
        let stages = self
            .stages
            .iter()
            .map(|stage| {
                stage
                    .iter()
                    .filter(|t| keep.contains(*t))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .filter(|stage| !stage.is_empty())
            .collect();
        ExecutionPlan { stages }
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            writeln!(f, "stage {i}: {}", stage.join(", "))?;
        }
        Ok(())
    }
}
