// tests/registry_matching.rs

mod common;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use buildwatch::errors::BuildError;
use buildwatch::transform::{FnTransform, Transform, TransformOutcome, TransformRegistry};

fn noop() -> Option<Arc<dyn Transform>> {
    Some(Arc::new(FnTransform::new("noop", |_ctx, input| {
        TransformOutcome::Written(PathBuf::from(input))
    })))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn web_registry() -> TransformRegistry {
    let mut r = TransformRegistry::new();
    r.register("sass", &strings(&["**/*.scss"]), &[], noop()).unwrap();
    r.register(
        "babel",
        &strings(&["./**/*.js"]),
        &strings(&["{lib,lib/**}", "{node_modules,node_modules/**}"]),
        noop(),
    )
    .unwrap();
    r.register("copy", &strings(&["**/*.{jpg,png,svg}", "**/*.html"]), &[], noop())
        .unwrap();
    r.register("views", &strings(&["views/*.pug"]), &[], noop()).unwrap();
    r.register("build", &[], &[], None).unwrap();
    r
}

#[test]
fn match_returns_every_task_whose_globs_match() {
    let r = web_registry();

    assert_eq!(r.match_path("styles/main.scss"), set(&["sass"]));
    assert_eq!(r.match_path("app.js"), set(&["babel"]));
    assert_eq!(r.match_path("img/logo.svg"), set(&["copy"]));
    assert!(r.match_path("README.md").is_empty());
}

#[test]
fn exclude_globs_win_over_includes() {
    let r = web_registry();

    assert!(r.match_path("lib/vendor.js").is_empty());
    assert!(r.match_path("node_modules/x/index.js").is_empty());
    assert_eq!(r.match_path("src/lib/util.js"), set(&["babel"]));
}

#[test]
fn single_star_never_crosses_a_separator() {
    let r = web_registry();

    assert_eq!(r.match_path("views/index.pug"), set(&["views"]));
    assert!(r.match_path("views/partials/head.pug").is_empty());
}

#[test]
fn matching_is_case_sensitive() {
    let r = web_registry();
    assert!(r.match_path("IMG/LOGO.SVG").is_empty());
    assert!(r.match_path("styles/main.SCSS").is_empty());
}

#[test]
fn aggregate_tasks_match_nothing() {
    let r = web_registry();
    assert!(!r.match_paths(["a.scss", "b.js", "c.png"]).contains("build"));
    assert!(r.resolve("build").unwrap().transform().is_none());
}

#[test]
fn match_paths_unions_results() {
    let r = web_registry();
    assert_eq!(
        r.match_paths(["a.scss", "b.js", "x/c.html"]),
        set(&["babel", "copy", "sass"])
    );
}

#[test]
fn registration_errors() {
    let mut r = web_registry();

    assert!(matches!(
        r.register("sass", &[], &[], None),
        Err(BuildError::DuplicateTask(name)) if name == "sass"
    ));

    match r.register("broken", &strings(&["src/[a-"]), &[], noop()) {
        Err(BuildError::InvalidGlob { task, pattern, .. }) => {
            assert_eq!(task, "broken");
            assert_eq!(pattern, "src/[a-");
        }
        other => panic!("expected InvalidGlob, got {other:?}"),
    }

    assert!(matches!(r.resolve("nope"), Err(BuildError::UnknownTask(_))));
    assert_eq!(r.len(), 5);
}

#[test]
fn question_mark_and_classes() {
    let mut r = TransformRegistry::new();
    r.register("q", &strings(&["file?.txt", "[ab]*.md"]), &[], noop())
        .unwrap();

    assert_eq!(r.match_path("file1.txt"), set(&["q"]));
    assert!(r.match_path("file10.txt").is_empty());
    assert_eq!(r.match_path("beta.md"), set(&["q"]));
    assert!(r.match_path("gamma.md").is_empty());
}
