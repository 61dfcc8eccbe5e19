// tests/cli_args.rs

use std::path::PathBuf;

use clap::Parser;

use buildwatch::cli::{CliArgs, Command, LogLevel};
use buildwatch::failure_exit_code;
use buildwatch::logging::resolve_level;

#[test]
fn no_subcommand_means_build() {
    let args = CliArgs::try_parse_from(["buildwatch"]).unwrap();
    assert!(matches!(args.command(), Command::Build));
    assert_eq!(args.config, PathBuf::from("Buildwatch.toml"));
    assert!(!args.dry_run);
    assert!(args.env.is_none());
}

#[test]
fn watch_with_global_flags() {
    let args = CliArgs::try_parse_from([
        "buildwatch",
        "watch",
        "--env",
        "production",
        "--conf",
        "conf/prod.json",
        "--config",
        "site/Buildwatch.toml",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert!(matches!(args.command(), Command::Watch));
    assert_eq!(args.env.as_deref(), Some("production"));
    assert_eq!(args.conf, Some(PathBuf::from("conf/prod.json")));
    assert_eq!(args.config, PathBuf::from("site/Buildwatch.toml"));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
}

#[test]
fn unknown_subcommand_names_a_task() {
    let args = CliArgs::try_parse_from(["buildwatch", "--dry-run", "sass"]).unwrap();
    match args.command() {
        Command::Task(argv) => assert_eq!(argv, vec!["sass"]),
        other => panic!("expected a task invocation, got {other:?}"),
    }
    assert!(args.dry_run);
}

#[test]
fn invalid_log_level_is_rejected() {
    assert!(CliArgs::try_parse_from(["buildwatch", "--log-level", "loud"]).is_err());
}

#[test]
fn exit_code_is_the_failed_count_clamped() {
    assert_eq!(failure_exit_code(0), 1);
    assert_eq!(failure_exit_code(3), 3);
    assert_eq!(failure_exit_code(255), 255);
    assert_eq!(failure_exit_code(1_000), 255);
}

#[test]
fn log_level_precedence() {
    assert_eq!(
        resolve_level(Some(LogLevel::Warn), Some("trace")),
        tracing::Level::WARN
    );
    assert_eq!(resolve_level(None, Some(" Debug ")), tracing::Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warning")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("bogus")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}
