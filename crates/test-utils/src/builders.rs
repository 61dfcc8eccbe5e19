#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use buildwatch::config::{
    ConfigFile, ManifestSection, ProjectSection, RawConfigFile, TaskConfig,
};
use buildwatch::fs::FileSystem;
use buildwatch::fs::mock::MockFileSystem;
use buildwatch::project::{Project, ProjectBuilder, TaskSpec};
use buildwatch::transform::Transform;
use buildwatch::types::{SassStyle, TransformKind};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                project: ProjectSection::default(),
                manifest: ManifestSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn source(mut self, source: &str) -> Self {
        self.config.project.source = source.to_string();
        self
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.config.project.dest = dest.to_string();
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.project.debounce_ms = ms;
        self
    }

    pub fn max_parallel_files(mut self, n: usize) -> Self {
        self.config.project.max_parallel_files = n;
        self
    }

    pub fn manifest_suffix(mut self, env: &str, field: &str, suffix: &str) -> Self {
        self.config
            .manifest
            .suffix
            .entry(env.to_string())
            .or_default()
            .insert(field.to_string(), suffix.to_string());
        self
    }

    /// The raw config, for validation tests.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A task using `kind`.
    pub fn new(kind: TransformKind) -> Self {
        Self {
            task: TaskConfig {
                transform: Some(kind),
                ..TaskConfig::default()
            },
        }
    }

    /// An aggregate task (no transform).
    pub fn aggregate() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn input(mut self, pattern: &str) -> Self {
        self.task.inputs.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.task.exclude.push(pattern.to_string());
        self
    }

    pub fn dest(mut self, subdir: &str) -> Self {
        self.task.dest = Some(subdir.to_string());
        self
    }

    pub fn extension(mut self, ext: &str) -> Self {
        self.task.extension = Some(ext.to_string());
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.task.cmd = Some(cmd.to_string());
        self
    }

    pub fn overwrite(mut self, val: bool) -> Self {
        self.task.overwrite = Some(val);
        self
    }

    pub fn style(mut self, style: SassStyle) -> Self {
        self.task.style = style;
        self
    }

    pub fn bundle(mut self, output: &str) -> Self {
        self.task.bundle = Some(output.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Project over an in-memory filesystem rooted at `src` / `out`.
pub struct MockProjectBuilder {
    fs: MockFileSystem,
    builder: ProjectBuilder,
}

impl MockProjectBuilder {
    pub fn new() -> Self {
        let fs = MockFileSystem::new();
        fs.add_dir("src");
        let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
        Self {
            builder: Project::builder("src", "out").filesystem(shared),
            fs,
        }
    }

    pub fn fs(&self) -> &MockFileSystem {
        &self.fs
    }

    pub fn file(self, rel: &str, content: &str) -> Self {
        self.fs.add_file(Path::new("src").join(rel), content.as_bytes());
        self
    }

    pub fn configure(mut self, f: impl FnOnce(ProjectBuilder) -> ProjectBuilder) -> Self {
        self.builder = f(self.builder);
        self
    }

    pub fn task(
        mut self,
        name: &str,
        after: &[&str],
        inputs: &[&str],
        transform: Option<Arc<dyn Transform>>,
    ) -> Self {
        let mut spec = TaskSpec::new(name)
            .after(after.iter().copied())
            .inputs(inputs.iter().copied());
        if let Some(t) = transform {
            spec = spec.transform(t);
        }
        self.builder
            .declare_task(spec)
            .expect("declaring task in test project");
        self
    }

    pub fn build(self) -> (Project, MockFileSystem) {
        let project = self.builder.build().expect("building test project");
        (project, self.fs)
    }
}

impl Default for MockProjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}
