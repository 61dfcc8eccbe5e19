// src/transform/patterns.rs

use std::fmt;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{BuildError, Result};

/// Compiled input/exclude glob patterns for a single task.
///
/// The patterns are relative to the source root. Callers pass relative,
/// forward-slash paths (e.g. `"stylesheets/main.scss"`) into [`matches`].
///
/// `*` never crosses a `/`; use `**` for any depth. Alternation groups
/// (`{jpg,png}`) are supported and matching is case-sensitive.
///
/// [`matches`]: InputPatterns::matches
#[derive(Clone)]
pub struct InputPatterns {
    include: GlobSet,
    exclude: Option<GlobSet>,
    raw_include: Vec<String>,
    raw_exclude: Vec<String>,
}

impl fmt::Debug for InputPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPatterns")
            .field("include", &self.raw_include)
            .field("exclude", &self.raw_exclude)
            .finish_non_exhaustive()
    }
}

impl InputPatterns {
    /// Compile the patterns of task `task`.
    pub fn new(task: &str, include: &[String], exclude: &[String]) -> Result<Self> {
        let raw_include: Vec<String> = include.iter().map(|p| normalize(p)).collect();
        let raw_exclude: Vec<String> = exclude.iter().map(|p| normalize(p)).collect();

        let include_set = build_globset(task, &raw_include)?;
        let exclude_set = if raw_exclude.is_empty() {
            None
        } else {
            Some(build_globset(task, &raw_exclude)?)
        };

        Ok(Self {
            include: include_set,
            exclude: exclude_set,
            raw_include,
            raw_exclude,
        })
    }

    /// No include patterns at all (the task is not driven by source files).
    pub fn is_empty(&self) -> bool {
        self.raw_include.is_empty()
    }

    pub fn include(&self) -> &[String] {
        &self.raw_include
    }

    pub fn exclude(&self) -> &[String] {
        &self.raw_exclude
    }

    /// Returns true if the given relative path is an input of this task.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

fn normalize(pattern: &str) -> String {
    pattern.trim().trim_start_matches("./").to_string()
}

fn build_globset(task: &str, patterns: &[String]) -> Result<GlobSet> {
    let invalid = |pattern: &str, source: globset::Error| BuildError::InvalidGlob {
        task: task.to_string(),
        pattern: pattern.to_string(),
        source,
    };

    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|e| invalid(pat, e))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| invalid(&patterns.join(", "), e))
}
