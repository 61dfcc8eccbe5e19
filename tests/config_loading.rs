// tests/config_loading.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};

use std::fs;
use std::path::{Path, PathBuf};

use buildwatch::config::env::{default_env_file, resolve_env_name_from, select};
use buildwatch::config::loader::project_root_dir;
use buildwatch::config::{ConfigFile, EnvSelection, load_and_validate, parse_str};
use buildwatch::errors::BuildError;
use buildwatch::project::Project;
use buildwatch::types::{SassStyle, TransformKind};

const SAMPLE: &str = r#"
[project]
source = "app"
dest = "dist"
debounce_ms = 150
max_parallel_files = 4

[manifest.suffix.development]
name = "-dev"
productName = " Dev"

[task.clean]
transform = "clean"

[task.sass]
transform = "sass"
inputs = ["**/*.scss"]
exclude = ["vendor/**"]
after = ["clean"]
dest = "css"
style = "compressed"

[task.copy]
transform = "copy"
inputs = ["**/*.{png,svg}"]
after = ["clean"]
overwrite = false

[task.lint]
transform = "command"
inputs = ["**/*.js"]
cmd = "eslint {input}"

[task.build]
after = ["sass", "copy", "lint"]
"#;

fn config_error(raw: &str) -> String {
    let raw = parse_str(raw).expect("sample parses");
    match ConfigFile::try_from(raw) {
        Err(BuildError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn sample_project_file_parses_and_validates() {
    let cfg = ConfigFile::try_from(parse_str(SAMPLE).unwrap()).unwrap();

    assert_eq!(cfg.project.source, "app");
    assert_eq!(cfg.project.dest, "dist");
    assert_eq!(cfg.project.debounce_ms, 150);
    assert_eq!(cfg.project.max_parallel_files, 4);
    assert!(cfg.project.parallel_tasks);
    assert_eq!(cfg.project.default_env, "development");
    assert_eq!(cfg.task.len(), 5);

    let sass = &cfg.task["sass"];
    assert_eq!(sass.transform, Some(TransformKind::Sass));
    assert_eq!(sass.exclude, vec!["vendor/**"]);
    assert_eq!(sass.dest.as_deref(), Some("css"));
    assert_eq!(sass.style, SassStyle::Compressed);

    assert!(!cfg.task["copy"].effective_overwrite());
    assert!(cfg.task["sass"].effective_overwrite());
    assert_eq!(cfg.task["build"].transform, None);
    assert_eq!(cfg.manifest.suffix["development"]["name"], "-dev");
}

#[test]
fn defaults_apply_when_project_section_is_missing() {
    let cfg = ConfigFile::try_from(parse_str("[task.build]\n").unwrap()).unwrap();
    assert_eq!(cfg.project.source, "app");
    assert_eq!(cfg.project.dest, "build");
    assert_eq!(cfg.project.debounce_ms, 200);
    assert_eq!(cfg.project.max_parallel_files, 8);
    assert_eq!(cfg.project.env_dir, "config");
}

#[test]
fn unknown_transform_is_a_toml_error() {
    let err = parse_str("[task.x]\ntransform = \"webpack\"\n").unwrap_err();
    assert!(matches!(err, BuildError::TomlError(_)));
}

#[test]
fn validation_rejects_bad_projects() {
    assert!(config_error("").contains("at least one"));
    assert!(config_error("[project]\ndebounce_ms = 0\n[task.a]\n").contains("debounce_ms"));
    assert!(
        config_error("[project]\nmax_parallel_files = 0\n[task.a]\n").contains("max_parallel_files")
    );
    assert!(config_error("[project]\nsource = \"x\"\ndest = \"x/\"\n[task.a]\n").contains("differ"));
    assert!(config_error("[project]\ndest = \" \"\n[task.a]\n").contains("must not be empty"));
}

#[test]
fn dest_nested_in_source_is_rejected() {
    let nested = |source: &str, dest: &str| {
        config_error(&format!(
            "[project]\nsource = \"{source}\"\ndest = \"{dest}\"\n[task.a]\n"
        ))
    };
    assert!(nested(".", "build").contains("must not contain each other"));
    assert!(nested("site", "./site/out/").contains("must not contain each other"));
    assert!(nested("app/src", "app").contains("must not contain each other"));
    assert!(nested("app", "app/../app").contains("differ"));

    for (source, dest) in [
        ("app", "build"),
        ("app", "app-build"),
        (".", "../out"),
        ("site/app", "site/../build"),
    ] {
        let raw = parse_str(&format!(
            "[project]\nsource = \"{source}\"\ndest = \"{dest}\"\n[task.a]\n"
        ))
        .unwrap();
        assert!(ConfigFile::try_from(raw).is_ok(), "{source} / {dest}");
    }
}

#[test]
fn project_builder_rejects_nested_roots() {
    for (source, dest) in [("site", "site/build"), ("site/app", "site")] {
        assert!(matches!(
            Project::builder(source, dest).build(),
            Err(BuildError::ConfigError(msg)) if msg.contains("must not contain each other")
        ));
    }
    assert!(Project::builder("site/app", "site/build").build().is_ok());
}

#[test]
fn validation_rejects_bad_tasks() {
    assert!(
        config_error("[task.build]\ninputs = [\"*.js\"]\n").contains("no transform")
    );
    assert!(
        config_error("[task.sass]\ntransform = \"sass\"\n").contains("needs at least one pattern")
    );
    assert!(
        config_error("[task.env]\ntransform = \"env\"\ninputs = [\"*\"]\n")
            .contains("does not take `inputs`")
    );
    assert!(
        config_error("[task.lint]\ntransform = \"command\"\ninputs = [\"*.js\"]\ncmd = \"  \"\n")
            .contains("has no `cmd`")
    );
    assert!(
        config_error("[task.img]\ntransform = \"copy\"\ninputs = [\"*\"]\nbundle = \"all\"\n")
            .contains("only applies to transform 'sass'")
    );
}

#[test]
fn builder_raw_config_goes_through_the_same_validation() {
    let raw = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new(TransformKind::Copy).build())
        .raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(BuildError::ConfigError(_))
    ));
}

#[test]
fn load_and_validate_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Buildwatch.toml");
    fs::write(&path, SAMPLE).unwrap();

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.task.len(), 5);
    assert_eq!(project_root_dir(&path), dir.path());

    assert!(matches!(
        load_and_validate(dir.path().join("missing.toml")),
        Err(BuildError::IoError(_))
    ));
}

#[test]
fn env_name_resolution_order() {
    assert_eq!(
        resolve_env_name_from(Some("production"), Some("staging".into()), "development"),
        "production"
    );
    assert_eq!(
        resolve_env_name_from(None, Some("staging".into()), "development"),
        "staging"
    );
    assert_eq!(
        resolve_env_name_from(Some("  "), Some(String::new()), "development"),
        "development"
    );
    assert_eq!(resolve_env_name_from(None, None, "test"), "test");
}

#[test]
fn env_config_file_location() {
    let cfg = ConfigFile::try_from(parse_str(SAMPLE).unwrap()).unwrap();
    let dir = Path::new("/proj");

    assert_eq!(
        default_env_file(dir, "config", "production"),
        PathBuf::from("/proj/config/env_production.json")
    );
    assert_eq!(
        select(dir, &cfg.project, Some("production"), None),
        EnvSelection {
            name: "production".to_string(),
            config_path: PathBuf::from("/proj/config/env_production.json"),
        }
    );
    assert_eq!(
        select(dir, &cfg.project, Some("qa"), Some(Path::new("/etc/qa.json"))).config_path,
        PathBuf::from("/etc/qa.json")
    );
}

#[test]
fn graph_errors_surface_when_the_project_is_assembled() {
    let dir = tempfile::tempdir().unwrap();
    let env = EnvSelection {
        name: "development".to_string(),
        config_path: dir.path().join("config/env_development.json"),
    };

    let unknown = ConfigFileBuilder::new()
        .with_task("build", TaskConfigBuilder::aggregate().after("sass").build())
        .build();
    assert!(matches!(
        Project::from_config(&unknown, dir.path(), env.clone()),
        Err(BuildError::UnknownPrerequisite { task, prerequisite })
            if task == "build" && prerequisite == "sass"
    ));

    let cyclic = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::aggregate().after("b").build())
        .with_task("b", TaskConfigBuilder::aggregate().after("a").build())
        .build();
    assert!(matches!(
        Project::from_config(&cyclic, dir.path(), env.clone()),
        Err(BuildError::CycleDetected(members)) if members == vec!["a", "b"]
    ));

    let bad_glob = ConfigFileBuilder::new()
        .with_task(
            "copy",
            TaskConfigBuilder::new(TransformKind::Copy).input("[oops").build(),
        )
        .build();
    assert!(matches!(
        Project::from_config(&bad_glob, dir.path(), env),
        Err(BuildError::InvalidGlob { .. })
    ));
}

#[test]
fn plan_for_task_includes_prerequisites_only() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ConfigFile::try_from(parse_str(SAMPLE).unwrap()).unwrap();
    let env = select(dir.path(), &cfg.project, None, None);
    let project = Project::from_config(&cfg, dir.path(), env).unwrap();

    let plan = project.plan_for_task("sass").unwrap();
    assert_eq!(plan.tasks().collect::<Vec<_>>(), vec!["clean", "sass"]);
    assert!(matches!(
        project.plan_for_task("deploy"),
        Err(BuildError::UnknownTask(_))
    ));
    assert_eq!(project.debounce().as_millis(), 150);
}
