// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod project;
pub mod shutdown;
pub mod transform;
pub mod types;
pub mod watch;

use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::loader::{load_and_validate, project_root_dir};
use crate::dag::ExecutionPlan;
use crate::engine::{Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::{RealRunnerBackend, RunReport};
use crate::project::Project;
use crate::shutdown::ShutdownTrigger;
use crate::watch::{ChangeAggregator, RawChange};

pub use crate::project::{ProjectBuilder, TaskSpec};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project file loading and environment selection
/// - project assembly (graph + registry)
/// - the runner, and for `watch` the watcher, aggregator and runtime
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<ExitCode> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading project file {:?}", args.config))?;
    let project_dir = project_root_dir(&args.config);
    let env = config::env::select(
        &project_dir,
        &cfg.project,
        args.env.as_deref(),
        args.conf.as_deref(),
    );
    let project = Project::from_config(&cfg, &project_dir, env)?;

    let command = args.command();
    let plan = match &command {
        Command::Build | Command::Watch => project.plan().clone(),
        Command::Task(argv) => {
            let name = argv
                .first()
                .context("missing task name")?;
            if argv.len() > 1 {
                warn!(task = %name, extra = ?&argv[1..], "ignoring extra arguments");
            }
            project.plan_for_task(name)?
        }
    };

    if args.dry_run {
        print_dry_run(&project, &plan);
        return Ok(ExitCode::SUCCESS);
    }

    match command {
        Command::Watch => run_watch(&project).await,
        Command::Build | Command::Task(_) => run_build(&project, &plan).await,
    }
}

/// Run `plan` once and report failures.
async fn run_build(project: &Project, plan: &ExecutionPlan) -> Result<ExitCode> {
    let (trigger, shutdown) = shutdown::channel();
    spawn_ctrl_c(trigger, None);

    let report = project.runner().run(plan, &shutdown).await;
    report.log_summary(0);

    if report.is_success() {
        return Ok(ExitCode::SUCCESS);
    }

    print_failures(&report);
    Ok(ExitCode::from(failure_exit_code(report.failed_file_count())))
}

/// Build, then keep the output tree in sync until Ctrl-C.
async fn run_watch(project: &Project) -> Result<ExitCode> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let (trigger, shutdown) = shutdown::channel();

    let backend = RealRunnerBackend::new(project.runner(), shutdown.clone(), rt_tx.clone());

    let (raw_tx, raw_rx) = mpsc::unbounded_channel::<RawChange>();
    let mut watch_handle = watch::subscribe(project.source_root(), raw_tx)?;
    let aggregator =
        ChangeAggregator::new(project.debounce()).spawn(raw_rx, rt_tx.clone(), shutdown.clone());

    spawn_ctrl_c(trigger.clone(), Some(rt_tx.clone()));

    rt_tx
        .send(RuntimeEvent::FullBuildRequested)
        .await
        .context("queueing initial build")?;

    let core = project.core_runtime(RuntimeOptions {
        exit_when_idle: false,
    });
    Runtime::new(core, rt_rx, backend, trigger).run().await?;

    watch_handle.unsubscribe();
    aggregator.abort();
    info!("watch stopped");
    Ok(ExitCode::SUCCESS)
}

/// Ctrl-C → trigger shutdown and, if given, tell the runtime.
fn spawn_ctrl_c(trigger: ShutdownTrigger, runtime_tx: Option<mpsc::Sender<RuntimeEvent>>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        info!("Ctrl+C received; shutting down");
        trigger.trigger();
        if let Some(tx) = runtime_tx {
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        }
    });
}

/// Exit status for a failed build: the failed-file count, clamped to 1..=255.
pub fn failure_exit_code(failed_files: usize) -> u8 {
    failed_files.clamp(1, 255) as u8
}

fn print_failures(report: &RunReport) {
    println!("build failed: {} file(s) failed", report.failed_file_count());
    for task in &report.tasks {
        for failure in &task.files_failed {
            println!(
                "  [{}] {}: {}",
                task.task,
                failure.path.display(),
                failure.error
            );
        }
        if let Some(err) = &task.error {
            println!("  [{}] {}", task.task, err);
        }
    }
    if !report.skipped.is_empty() {
        println!("  skipped: {}", report.skipped.join(", "));
    }
    if report.cancelled {
        println!("  (cancelled)");
    }
}

/// Dry-run output: environment, stages and per-task details.
fn print_dry_run(project: &Project, plan: &ExecutionPlan) {
    println!("buildwatch dry-run");
    if let Some(env) = project.env() {
        println!("  env = {} ({})", env.name, env.config_path.display());
    }
    println!("  source = {}", project.source_root().display());
    println!("  dest = {}", project.dest_root().display());
    println!();

    println!("stages ({}):", plan.len());
    for (idx, stage) in plan.stages().iter().enumerate() {
        println!("  {idx}: {}", stage.join(", "));
    }
    println!();

    println!("tasks ({}):", plan.task_count());
    for name in plan.tasks() {
        println!("  - {name}");
        let Ok(task) = project.registry().resolve(name) else {
            continue;
        };
        let kind = task.transform().map(|t| t.kind()).unwrap_or("none");
        println!("      transform: {kind}");
        let deps = project.graph().dependencies_of(name);
        if !deps.is_empty() {
            println!("      after: {:?}", deps);
        }
        if !task.patterns().include().is_empty() {
            println!("      inputs: {:?}", task.patterns().include());
        }
        if !task.patterns().exclude().is_empty() {
            println!("      exclude: {:?}", task.patterns().exclude());
        }
    }

    debug!("dry-run complete (no execution)");
}
