// tests/builtin_transforms.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::init_tracing;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use buildwatch::config::env::select;
use buildwatch::fs::RealFileSystem;
use buildwatch::project::Project;
use buildwatch::shutdown::Shutdown;
use buildwatch::transform::clean::CleanTransform;
use buildwatch::transform::command::{CommandTransform, expand_placeholders};
use buildwatch::transform::copy::CopyTransform;
use buildwatch::transform::env_config::EnvConfigTransform;
use buildwatch::transform::manifest::{FieldSuffix, ManifestTransform};
use buildwatch::transform::sass::SassTransform;
use buildwatch::transform::template::TemplateTransform;
use buildwatch::transform::{OutputLayout, Transform, TransformContext, TransformOutcome};
use buildwatch::types::{SassStyle, TransformKind};

struct Sandbox {
    dir: TempDir,
    ctx: TransformContext,
}

impl Sandbox {
    fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let ctx = TransformContext::new(
            src,
            dir.path().join("out"),
            "development",
            Arc::new(RealFileSystem),
        );
        Self { dir, ctx }
    }

    fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.ctx.source_root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn out(&self, rel: &str) -> String {
        fs::read_to_string(self.ctx.dest_root.join(rel)).unwrap()
    }

    async fn apply(&self, t: &dyn Transform, input: &Path) -> TransformOutcome {
        t.apply(&self.ctx, input).await
    }
}

fn layout(subdir: Option<&str>, ext: Option<&str>) -> OutputLayout {
    OutputLayout {
        subdir: subdir.map(str::to_string),
        extension: ext.map(str::to_string),
    }
}

#[tokio::test]
async fn copy_mirrors_the_relative_path_and_respects_overwrite() {
    let sb = Sandbox::new();
    let input = sb.file("img/logo.svg", "<svg/>");

    let t = CopyTransform::new(layout(Some("assets"), None), false);
    let outcome = sb.apply(&t, &input).await;
    assert_eq!(
        outcome,
        TransformOutcome::Written(sb.ctx.dest_root.join("assets/img/logo.svg"))
    );
    assert_eq!(sb.out("assets/img/logo.svg"), "<svg/>");

    fs::write(&input, "<svg id=\"new\"/>").unwrap();
    assert!(matches!(sb.apply(&t, &input).await, TransformOutcome::Skipped(_)));
    assert_eq!(sb.out("assets/img/logo.svg"), "<svg/>");

    let t = CopyTransform::new(layout(Some("assets"), None), true);
    assert!(matches!(sb.apply(&t, &input).await, TransformOutcome::Written(_)));
    assert_eq!(sb.out("assets/img/logo.svg"), "<svg id=\"new\"/>");
}

#[tokio::test]
async fn sass_compiles_imports_and_skips_partials() {
    let sb = Sandbox::new();
    let partial = sb.file("styles/_vars.scss", "$accent: #ff0000;\n");
    let main = sb.file(
        "styles/main.scss",
        "@import 'vars';\n.button { color: $accent; }\n",
    );

    let t = SassTransform::new(OutputLayout::default(), SassStyle::Expanded);

    assert_eq!(
        sb.apply(&t, &partial).await,
        TransformOutcome::Skipped("partial".to_string())
    );
    let outcome = sb.apply(&t, &main).await;
    assert_eq!(
        outcome,
        TransformOutcome::Written(sb.ctx.dest_root.join("styles/main.css"))
    );
    let css = sb.out("styles/main.css");
    assert!(css.contains(".button"), "{css}");
    assert!(css.contains("color: #ff0000") || css.contains("color: red"), "{css}");
}

#[tokio::test]
async fn sass_compressed_style_and_syntax_errors() {
    let sb = Sandbox::new();
    let main = sb.file("a.scss", "a { b { color: blue; } }\n");
    let broken = sb.file("broken.scss", "a { color: ;\n");

    let t = SassTransform::new(OutputLayout::default(), SassStyle::Compressed);

    assert!(matches!(sb.apply(&t, &main).await, TransformOutcome::Written(_)));
    assert_eq!(sb.out("a.css").trim(), "a b{color:blue}");

    assert!(sb.apply(&t, &broken).await.is_failure());
}

#[tokio::test]
async fn templates_see_env_and_path_and_resolve_includes() {
    let sb = Sandbox::new();
    sb.file("views/_header.html", "<h1>{{ env }}</h1>");
    let page = sb.file(
        "views/index.j2",
        "{% include \"views/_header.html\" %}<p>{{ path }}</p>",
    );

    let t = TemplateTransform::new(OutputLayout::default());
    let outcome = sb.apply(&t, &page).await;

    assert_eq!(
        outcome,
        TransformOutcome::Written(sb.ctx.dest_root.join("views/index.html"))
    );
    assert_eq!(
        sb.out("views/index.html"),
        "<h1>development</h1><p>views/index.j2</p>"
    );
}

#[tokio::test]
async fn template_errors_are_file_failures() {
    let sb = Sandbox::new();
    let page = sb.file("bad.html", "{% include \"missing.html\" %}");

    let t = TemplateTransform::new(OutputLayout::default());
    assert!(sb.apply(&t, &page).await.is_failure());
}

#[test]
fn placeholders_are_expanded() {
    let line = expand_placeholders(
        "lint {input} -o {output} --name {rel} --env {env} {input}",
        Path::new("/p/src/a.js"),
        Path::new("/p/out/a.js"),
        "a.js",
        "production",
    );
    assert_eq!(
        line,
        "lint /p/src/a.js -o /p/out/a.js --name a.js --env production /p/src/a.js"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn command_writes_output_when_it_mentions_it() {
    let sb = Sandbox::new();
    let input = sb.file("js/app.js", "let a = 1;");

    let t = CommandTransform::new(layout(Some("js-out"), None), "cp {input} {output}");
    let outcome = sb.apply(&t, &input).await;

    assert_eq!(
        outcome,
        TransformOutcome::Written(sb.ctx.dest_root.join("js-out/js/app.js"))
    );
    assert_eq!(sb.out("js-out/js/app.js"), "let a = 1;");
}

#[cfg(unix)]
#[tokio::test]
async fn command_failures_carry_status_and_stderr() {
    let sb = Sandbox::new();
    let input = sb.file("app.js", "x");

    let lint = CommandTransform::new(OutputLayout::default(), "echo \"bad {rel}\" >&2; exit 3");
    match sb.apply(&lint, &input).await {
        TransformOutcome::Failed(err) => {
            assert_eq!(err.message(), "command exited with status 3: bad app.js");
        }
        other => panic!("expected failure, got {other:?}"),
    }

    let check = CommandTransform::new(OutputLayout::default(), "test -f {rel}");
    assert_eq!(
        sb.apply(&check, &input).await,
        TransformOutcome::Skipped("command produced no output file".to_string())
    );
}

#[tokio::test]
async fn env_config_is_written_as_env_json() {
    let sb = Sandbox::new();
    let conf = sb.dir.path().join("config/env_development.json");
    fs::create_dir_all(conf.parent().unwrap()).unwrap();
    fs::write(&conf, "{\"api\":\"http://localhost\"}").unwrap();

    let t = EnvConfigTransform::new(&conf);
    let outcome = sb.apply(&t, &sb.ctx.source_root).await;

    assert_eq!(outcome, TransformOutcome::Written(sb.ctx.dest_root.join("env.json")));
    assert_eq!(sb.out("env.json"), "{\"api\":\"http://localhost\"}");

    let missing = EnvConfigTransform::new(sb.dir.path().join("config/env_nope.json"));
    match sb.apply(&missing, &sb.ctx.source_root).await {
        TransformOutcome::Failed(err) => {
            assert!(
                err.message()
                    .starts_with("environment 'development' has no usable config"),
                "{}",
                err.message()
            );
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn manifest_suffix_is_appended_and_key_order_kept() {
    let sb = Sandbox::new();
    let input = sb.file(
        "package.json",
        r#"{"version":"1.0.0","name":"shop","productName":"Shop","main":"index.js"}"#,
    );

    let mut suffixes = BTreeMap::new();
    suffixes.insert(
        "development".to_string(),
        BTreeMap::from([
            ("name".to_string(), "-dev".to_string()),
            ("productName".to_string(), " Dev".to_string()),
        ]),
    );
    let t = ManifestTransform::new(OutputLayout::default())
        .with_rewriter(Arc::new(FieldSuffix::new(suffixes)));

    assert!(matches!(sb.apply(&t, &input).await, TransformOutcome::Written(_)));
    let expected = "{\n  \"version\": \"1.0.0\",\n  \"name\": \"shop-dev\",\n  \"productName\": \"Shop Dev\",\n  \"main\": \"index.js\"\n}\n";
    assert_eq!(sb.out("package.json"), expected);

    // The source is read fresh each run, so rebuilding gives the same output.
    sb.apply(&t, &input).await;
    assert_eq!(sb.out("package.json"), expected);

    // The suffix is appended even when the name already ends with it.
    fs::write(&input, r#"{"name":"my-dev"}"#).unwrap();
    sb.apply(&t, &input).await;
    assert_eq!(sb.out("package.json"), "{\n  \"name\": \"my-dev-dev\"\n}\n");

    fs::write(&input, "[1, 2]").unwrap();
    assert!(sb.apply(&t, &input).await.is_failure());
}

#[tokio::test]
async fn clean_empties_but_keeps_the_destination() {
    let sb = Sandbox::new();
    fs::create_dir_all(sb.ctx.dest_root.join("a/b")).unwrap();
    fs::write(sb.ctx.dest_root.join("a/b/c.txt"), "x").unwrap();
    fs::write(sb.ctx.dest_root.join("top.txt"), "y").unwrap();

    let outcome = sb.apply(&CleanTransform, &sb.ctx.source_root).await;

    assert_eq!(outcome, TransformOutcome::Written(sb.ctx.dest_root.clone()));
    assert!(sb.ctx.dest_root.is_dir());
    assert_eq!(fs::read_dir(&sb.ctx.dest_root).unwrap().count(), 0);
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut out = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    out
}

#[tokio::test]
async fn full_build_from_config_is_idempotent() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let write = |rel: &str, content: &str| {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, content).unwrap();
    };
    write("app/img/a.png", "PNG");
    write("app/styles/_base.scss", "$pad: 4px;");
    write("app/styles/site.scss", "@import 'base';\nbody { padding: $pad; }");
    write("app/views/index.html", "<p>{{ env }}</p>");
    write("app/package.json", r#"{"name":"shop"}"#);
    write("config/env_development.json", r#"{"debug":true}"#);

    let cfg = ConfigFileBuilder::new()
        .manifest_suffix("development", "name", "-dev")
        .with_task("clean", TaskConfigBuilder::new(TransformKind::Clean).build())
        .with_task(
            "copy",
            TaskConfigBuilder::new(TransformKind::Copy)
                .after("clean")
                .input("img/**")
                .build(),
        )
        .with_task(
            "sass",
            TaskConfigBuilder::new(TransformKind::Sass)
                .after("clean")
                .input("styles/*.scss")
                .dest("css")
                .build(),
        )
        .with_task(
            "views",
            TaskConfigBuilder::new(TransformKind::Template)
                .after("clean")
                .input("views/*.html")
                .build(),
        )
        .with_task(
            "manifest",
            TaskConfigBuilder::new(TransformKind::Manifest)
                .after("clean")
                .input("package.json")
                .build(),
        )
        .with_task("env", TaskConfigBuilder::new(TransformKind::Env).after("clean").build())
        .with_task(
            "build",
            TaskConfigBuilder::aggregate()
                .after("copy")
                .after("sass")
                .after("views")
                .after("manifest")
                .after("env")
                .build(),
        )
        .build();

    let env = select(root, &cfg.project, Some("development"), None);
    let project = Project::from_config(&cfg, root, env).unwrap();

    let first = project.runner().run(project.plan(), &Shutdown::never()).await;
    assert!(first.is_success(), "{first:?}");
    let after_first = snapshot(&root.join("build"));

    let second = project.runner().run(project.plan(), &Shutdown::never()).await;
    assert!(second.is_success(), "{second:?}");
    let after_second = snapshot(&root.join("build"));

    assert_eq!(after_first, after_second);
    assert_eq!(
        after_first.keys().cloned().collect::<Vec<_>>(),
        vec![
            PathBuf::from("css/styles/site.css"),
            PathBuf::from("env.json"),
            PathBuf::from("img/a.png"),
            PathBuf::from("package.json"),
            PathBuf::from("views/index.html"),
        ]
    );
    assert_eq!(
        after_first[Path::new("views/index.html")],
        b"<p>development</p>".to_vec()
    );
    assert_eq!(
        after_first[Path::new("package.json")],
        b"{\n  \"name\": \"shop-dev\"\n}\n".to_vec()
    );
}

#[tokio::test]
async fn sass_bundle_compiles_all_components_into_one_stylesheet() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let write = |rel: &str, content: &str| {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, content).unwrap();
    };
    write("app/components/a/button.scss", "$c: red;\n.button { color: $c; }");
    write("app/components/a/_unused.scss", "this is not valid scss {");
    write("app/components/z/card.scss", ".card { color: $c; }");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            "sass",
            TaskConfigBuilder::new(TransformKind::Sass)
                .input("components/**/*.scss")
                .bundle("stylesheets/styles")
                .style(SassStyle::Compressed)
                .build(),
        )
        .build();
    let env = select(root, &cfg.project, None, None);
    let project = Project::from_config(&cfg, root, env).unwrap();

    let report = project.runner().run(project.plan(), &Shutdown::never()).await;
    assert!(report.is_success(), "{report:?}");
    let sass = report.task("sass").unwrap();
    assert_eq!(sass.files_processed, 1);
    assert_eq!(sass.files_written, 1);

    let css = fs::read_to_string(root.join("build/stylesheets/styles.css")).unwrap();
    assert_eq!(css.trim(), ".button{color:red}.card{color:red}");
    assert!(!root.join("build/components").exists());
}
