// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem used by tests.
///
/// Cloning shares the underlying tree, so a test can keep a handle and
/// inspect what transforms wrote.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        if let Ok(mut files) = self.files.lock() {
            insert_file(&mut files, path.as_ref(), content.into());
        }
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        if let Ok(mut files) = self.files.lock() {
            ensure_dir_entry(&mut files, path.as_ref());
        }
    }

    /// Contents of a file, if it exists.
    pub fn file_contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let files = self.files.lock().ok()?;
        match files.get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// All file paths currently stored, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let Ok(files) = self.files.lock() else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = files
            .iter()
            .filter(|(_, entry)| matches!(entry, MockEntry::File(_)))
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<PathBuf, MockEntry>>> {
        self.files
            .lock()
            .map_err(|_| anyhow!("mock filesystem lock poisoned"))
    }
}

fn parent_or_root(path: &Path) -> Option<&Path> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        }
    })
}

fn link_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
        if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

fn insert_file(files: &mut HashMap<PathBuf, MockEntry>, path: &Path, content: Vec<u8>) {
    files.insert(path.to_path_buf(), MockEntry::File(content));

    // Parent directories exist implicitly in this mock.
    if let Some(parent) = parent_or_root(path) {
        ensure_dir_entry(files, parent);
        link_child(files, parent, path);
    }
}

fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if files.contains_key(path) {
        return;
    }
    files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    if let Some(parent) = parent_or_root(path) {
        // Avoid infinite loop at root
        if parent != path {
            ensure_dir_entry(files, parent);
            link_child(files, parent, path);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let files = self.entries()?;
        match files.get(path) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8 in {:?}: {}", path, e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut files = self.entries()?;
        if matches!(files.get(path), Some(MockEntry::Dir(_))) {
            return Err(anyhow!("Is a directory: {:?}", path));
        }
        insert_file(&mut files, path, contents.to_vec());
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        let content = self.read(src)?;
        self.write(dst, &content)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let mut files = self.entries()?;
        if !files.contains_key(path) {
            return Ok(());
        }
        files.retain(|p, _| !p.starts_with(path));

        if let Some(parent) = parent_or_root(path) {
            if let (Some(MockEntry::Dir(children)), Some(name)) =
                (files.get_mut(parent), path.file_name().and_then(|n| n.to_str()))
            {
                children.retain(|c| c != name);
            }
        }
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut files = self.entries()?;
        if matches!(files.get(path), Some(MockEntry::File(_))) {
            return Err(anyhow!("Is a file: {:?}", path));
        }
        ensure_dir_entry(&mut files, path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| matches!(files.get(path), Some(MockEntry::File(_))))
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| matches!(files.get(path), Some(MockEntry::Dir(_))))
            .unwrap_or(false)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.entries()?;
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
