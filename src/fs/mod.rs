// src/fs/mod.rs

//! Filesystem collaborator.
//!
//! Everything that touches the source or destination tree goes through the
//! [`FileSystem`] trait so the runner and transforms can be exercised against
//! the in-memory [`mock::MockFileSystem`].

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::transform::patterns::InputPatterns;
use crate::watch::path_utils::relative_str;

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write `contents` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Copy a single file, creating parent directories of `dst` as needed.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Remove a file or a directory tree. Missing paths are not an error.
    fn remove(&self, path: &Path) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        fs::write(path, contents).with_context(|| format!("writing to file {:?}", path))
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        fs::copy(src, dst).with_context(|| format!("copying {:?} to {:?}", src, dst))?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let res = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match res {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {:?}", path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("creating dir {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

/// Options for [`copy`].
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Replace files that already exist at the destination.
    pub overwrite: bool,
    /// When copying a directory, only copy files whose path relative to the
    /// source directory matches one of these globs. Empty means everything.
    pub matching: Vec<String>,
}

/// Copy a file or a directory tree from `src` to `dst`.
///
/// Returns the number of files copied. Without `overwrite`, an existing
/// destination file is an error.
pub fn copy(fs: &dyn FileSystem, src: &Path, dst: &Path, opts: &CopyOptions) -> Result<usize> {
    if fs.is_file(src) {
        copy_one(fs, src, dst, opts.overwrite)?;
        return Ok(1);
    }

    if !fs.is_dir(src) {
        return Err(anyhow!("copy source does not exist: {:?}", src));
    }

    let patterns = if opts.matching.is_empty() {
        InputPatterns::new("copy", &["**".to_string()], &[])?
    } else {
        InputPatterns::new("copy", &opts.matching, &[])?
    };

    let files = list(fs, src, &patterns)?;
    for file in &files {
        let rel = file
            .strip_prefix(src)
            .with_context(|| format!("relativizing {:?} against {:?}", file, src))?;
        copy_one(fs, file, &dst.join(rel), opts.overwrite)?;
    }
    Ok(files.len())
}

fn copy_one(fs: &dyn FileSystem, src: &Path, dst: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && fs.exists(dst) {
        return Err(anyhow!("destination already exists: {:?}", dst));
    }
    fs.copy_file(src, dst)
}

/// List every file under `root` whose path relative to `root` matches
/// `patterns`, sorted. A missing root lists nothing.
pub fn list(fs: &dyn FileSystem, root: &Path, patterns: &InputPatterns) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !fs.is_dir(root) {
        return Ok(files);
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Some(rel) = relative_str(root, &path) {
                    if patterns.matches(&rel) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Remove everything inside `dir`, keeping (or creating) the directory itself.
pub fn empty_dir(fs: &dyn FileSystem, dir: &Path) -> Result<()> {
    if fs.is_dir(dir) {
        for entry in fs.read_dir(dir)? {
            fs.remove(&entry)?;
        }
        Ok(())
    } else {
        fs.create_dir_all(dir)
    }
}
