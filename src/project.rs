// src/project.rs

//! Project assembly.
//!
//! A [`Project`] owns the validated task graph and the transform registry and
//! hands them to the runner and the scheduler. It is built either
//! programmatically through [`ProjectBuilder::declare_task`] or from a
//! project file with [`Project::from_config`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{ConfigFile, EnvSelection};
use crate::dag::{ExecutionPlan, TaskGraph, TaskGraphBuilder};
use crate::engine::{CoreRuntime, RuntimeOptions, TaskName};
use crate::errors::{BuildError, Result};
use crate::exec::{RunnerOptions, TaskRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::transform::builtin;
use crate::transform::{Transform, TransformContext, TransformRegistry};
use crate::watch::DEFAULT_DEBOUNCE;
use crate::watch::path_utils::paths_nest;

/// Declaration of one task.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: TaskName,
    pub prerequisites: Vec<TaskName>,
    pub inputs: Vec<String>,
    pub exclude: Vec<String>,
    pub transform: Option<Arc<dyn Transform>>,
}

impl TaskSpec {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            prerequisites: Vec::new(),
            inputs: Vec::new(),
            exclude: Vec::new(),
            transform: None,
        }
    }

    pub fn after<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        self.prerequisites
            .extend(prerequisites.into_iter().map(Into::into));
        self
    }

    pub fn inputs<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(globs.into_iter().map(Into::into));
        self
    }

    pub fn exclude<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(globs.into_iter().map(Into::into));
        self
    }

    pub fn transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Collects task declarations and project settings.
#[derive(Debug)]
pub struct ProjectBuilder {
    graph: TaskGraphBuilder,
    registry: TransformRegistry,
    source_root: PathBuf,
    dest_root: PathBuf,
    env: Option<EnvSelection>,
    env_name: String,
    fs: Arc<dyn FileSystem>,
    runner_options: RunnerOptions,
    debounce: Duration,
}

impl ProjectBuilder {
    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            graph: TaskGraphBuilder::new(),
            registry: TransformRegistry::new(),
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            env: None,
            env_name: "development".to_string(),
            fs: Arc::new(RealFileSystem),
            runner_options: RunnerOptions::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn env_name(mut self, name: impl Into<String>) -> Self {
        self.env_name = name.into();
        self
    }

    pub fn env(mut self, env: EnvSelection) -> Self {
        self.env_name = env.name.clone();
        self.env = Some(env);
        self
    }

    pub fn filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn runner_options(mut self, options: RunnerOptions) -> Self {
        self.runner_options = options;
        self
    }

    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Declare a task. Fails on duplicate names and invalid globs; graph
    /// errors are reported by [`build`](Self::build).
    pub fn declare_task(&mut self, spec: TaskSpec) -> Result<&mut Self> {
        self.graph.register(spec.name.clone(), spec.prerequisites)?;
        self.registry
            .register(spec.name, &spec.inputs, &spec.exclude, spec.transform)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Project> {
        if paths_nest(&self.source_root, &self.dest_root) {
            return Err(BuildError::ConfigError(format!(
                "source root {} and destination root {} must not contain each other",
                self.source_root.display(),
                self.dest_root.display()
            )));
        }
        let graph = self.graph.build()?;
        info!(
            tasks = graph.len(),
            stages = graph.plan().len(),
            source = ?self.source_root,
            dest = ?self.dest_root,
            "project assembled"
        );
        let ctx = TransformContext::new(self.source_root, self.dest_root, self.env_name, self.fs);
        Ok(Project {
            graph: Arc::new(graph),
            registry: Arc::new(self.registry),
            ctx: Arc::new(ctx),
            env: self.env,
            runner_options: self.runner_options,
            debounce: self.debounce,
        })
    }
}

/// A validated project: graph, registry and execution settings.
#[derive(Debug, Clone)]
pub struct Project {
    graph: Arc<TaskGraph>,
    registry: Arc<TransformRegistry>,
    ctx: Arc<TransformContext>,
    env: Option<EnvSelection>,
    runner_options: RunnerOptions,
    debounce: Duration,
}

impl Project {
    pub fn builder(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> ProjectBuilder {
        ProjectBuilder::new(source_root, dest_root)
    }

    /// Assemble a project from a validated project file.
    ///
    /// `project_dir` is the directory relative paths are resolved against.
    pub fn from_config(cfg: &ConfigFile, project_dir: &Path, env: EnvSelection) -> Result<Project> {
        let source_root = resolve_root(project_dir, &cfg.project.source);
        let dest_root = project_dir.join(&cfg.project.dest);

        let mut builder = ProjectBuilder::new(source_root, dest_root)
            .env(env.clone())
            .runner_options(RunnerOptions {
                parallel_tasks: cfg.project.parallel_tasks,
                max_parallel_files: cfg.project.max_parallel_files,
            })
            .debounce(Duration::from_millis(cfg.project.debounce_ms));

        for (name, task) in cfg.task.iter() {
            let mut spec = TaskSpec::new(name.clone())
                .after(task.after.iter().cloned())
                .inputs(task.inputs.iter().cloned())
                .exclude(task.exclude.iter().cloned());
            if let Some(transform) = builtin::instantiate(name, task, &cfg.manifest, &env)? {
                spec = spec.transform(transform);
            }
            debug!(task = %name, transform = ?task.transform, "declaring task from config");
            builder.declare_task(spec)?;
        }

        builder.build()
    }

    pub fn graph(&self) -> &Arc<TaskGraph> {
        &self.graph
    }

    pub fn registry(&self) -> &Arc<TransformRegistry> {
        &self.registry
    }

    pub fn context(&self) -> &Arc<TransformContext> {
        &self.ctx
    }

    pub fn env(&self) -> Option<&EnvSelection> {
        self.env.as_ref()
    }

    pub fn source_root(&self) -> &Path {
        &self.ctx.source_root
    }

    pub fn dest_root(&self) -> &Path {
        &self.ctx.dest_root
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn runner(&self) -> TaskRunner {
        TaskRunner::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.ctx),
            self.runner_options,
        )
    }

    /// The full plan.
    pub fn plan(&self) -> &ExecutionPlan {
        self.graph.plan()
    }

    /// Plan for invoking `task` together with everything it depends on.
    pub fn plan_for_task(&self, task: &str) -> Result<ExecutionPlan> {
        let closure = self.graph.with_prerequisites(task)?;
        Ok(self.graph.subplan(&closure))
    }

    pub fn core_runtime(&self, options: RuntimeOptions) -> CoreRuntime {
        CoreRuntime::new(
            Arc::clone(&self.graph),
            Arc::clone(&self.registry),
            self.ctx.source_root.clone(),
            options,
        )
    }
}

/// `project_dir/rel`, canonicalized when it exists so watcher paths share
/// its prefix.
fn resolve_root(project_dir: &Path, rel: &str) -> PathBuf {
    let joined = project_dir.join(rel);
    joined.canonicalize().unwrap_or(joined)
}
