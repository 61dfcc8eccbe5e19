// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::plan::ExecutionPlan;
use crate::engine::TaskName;
use crate::errors::{BuildError, Result};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct prerequisites, sorted and deduplicated.
    deps: Vec<TaskName>,
    /// Direct dependents, sorted.
    dependents: Vec<TaskName>,
}

/// Collects task declarations before the graph is validated.
#[derive(Debug, Clone, Default)]
pub struct TaskGraphBuilder {
    /// Declaration order, used for deterministic error reporting.
    order: Vec<TaskName>,
    prerequisites: BTreeMap<TaskName, Vec<TaskName>>,
}

impl TaskGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<I, S>(&mut self, name: impl Into<TaskName>, prerequisites: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let name = name.into();
        if self.prerequisites.contains_key(&name) {
            return Err(BuildError::DuplicateTask(name));
        }
        self.order.push(name.clone());
        self.prerequisites
            .insert(name, prerequisites.into_iter().map(Into::into).collect());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Validate the declarations and compute the staged plan.
    ///
    /// Errors, in order of precedence:
    /// - `UnknownPrerequisite` for the first offending prerequisite in
    ///   declaration order;
    /// - `CycleDetected` naming every task that lies on a cycle, sorted.
    pub fn build(self) -> Result<TaskGraph> {
        for name in &self.order {
            for prereq in &self.prerequisites[name] {
                if !self.prerequisites.contains_key(prereq) {
                    return Err(BuildError::UnknownPrerequisite {
                        task: name.clone(),
                        prerequisite: prereq.clone(),
                    });
                }
            }
        }

        let mut nodes: BTreeMap<TaskName, DagNode> = self
            .prerequisites
            .iter()
            .map(|(name, deps)| {
                let deps: BTreeSet<TaskName> = deps.iter().cloned().collect();
                (
                    name.clone(),
                    DagNode {
                        deps: deps.into_iter().collect(),
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        let edges: Vec<(TaskName, TaskName)> = nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(move |d| (d.clone(), name.clone())))
            .collect();
        for (dep, task) in edges {
            if let Some(dep_node) = nodes.get_mut(&dep) {
                dep_node.dependents.push(task);
            }
        }
        for node in nodes.values_mut() {
            node.dependents.sort();
        }

        let stages =
            kahn_stages(&nodes).ok_or_else(|| BuildError::CycleDetected(cycle_members(&nodes)))?;
        let plan = ExecutionPlan::from_stages(stages);
        debug!(tasks = nodes.len(), stages = plan.len(), "task graph built");

        Ok(TaskGraph {
            nodes,
            order: self.order,
            plan,
        })
    }
}

/// Kahn's algorithm, one stage per wave of zero in-degree tasks.
///
/// `None` when some tasks could not be scheduled, i.e. a cycle exists.
fn kahn_stages(nodes: &BTreeMap<TaskName, DagNode>) -> Option<Vec<Vec<TaskName>>> {
    let mut indegree: BTreeMap<&str, usize> = nodes
        .iter()
        .map(|(name, node)| (name.as_str(), node.deps.len()))
        .collect();

    let mut current: Vec<&str> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| *n)
        .collect();

    let mut stages = Vec::new();
    let mut placed = 0;

    while !current.is_empty() {
        current.sort_unstable();
        let mut next = Vec::new();
        for name in &current {
            for dependent in &nodes[*name].dependents {
                if let Some(d) = indegree.get_mut(dependent.as_str()) {
                    *d -= 1;
                    if *d == 0 {
                        next.push(dependent.as_str());
                    }
                }
            }
        }
        placed += current.len();
        stages.push(current.iter().map(|s| s.to_string()).collect());
        current = next;
    }

    (placed == nodes.len()).then_some(stages)
}

/// Tasks lying on a cycle: members of non-trivial strongly connected
/// components plus self-dependent tasks. Sorted.
fn cycle_members(nodes: &BTreeMap<TaskName, DagNode>) -> Vec<TaskName> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for name in nodes.keys() {
        graph.add_node(name.as_str());
    }
    for (name, node) in nodes {
        for dep in &node.deps {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    let mut members: Vec<TaskName> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(str::to_string)
        .collect();
    members.sort();
    members
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Dependents,
    Prerequisites,
}

/// Validated, acyclic task graph together with its full execution plan.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: BTreeMap<TaskName, DagNode>,
    order: Vec<TaskName>,
    plan: ExecutionPlan,
}

impl TaskGraph {
    /// Task names in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate prerequisites of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// `seeds` plus every task transitively depending on one of them.
    ///
    /// Unknown names are ignored.
    pub fn with_dependents<'s, I>(&self, seeds: I) -> BTreeSet<TaskName>
    where
        I: IntoIterator<Item = &'s str>,
    {
        self.closure(seeds, Direction::Dependents)
    }

    /// `name` plus every task it transitively depends on.
    pub fn with_prerequisites(&self, name: &str) -> Result<BTreeSet<TaskName>> {
        if !self.contains(name) {
            return Err(BuildError::UnknownTask(name.to_string()));
        }
        Ok(self.closure([name], Direction::Prerequisites))
    }

    fn closure<'s, I>(&self, seeds: I, direction: Direction) -> BTreeSet<TaskName>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut stack: Vec<TaskName> = seeds
            .into_iter()
            .filter(|s| self.contains(s))
            .map(str::to_string)
            .collect();
        let mut visited: HashSet<TaskName> = HashSet::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let next = match direction {
                Direction::Dependents => self.dependents_of(&name),
                Direction::Prerequisites => self.dependencies_of(&name),
            };
            stack.extend(next.iter().cloned());
        }
        visited.into_iter().collect()
    }

    /// The full plan: every task, staged.
    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// The full plan restricted to `tasks`, stage order preserved.
    pub fn subplan(&self, tasks: &BTreeSet<TaskName>) -> ExecutionPlan {
        self.plan.restrict(tasks)
    }
}
