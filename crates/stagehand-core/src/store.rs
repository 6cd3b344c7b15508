//! Text artifact storage under a single content root.
//!
//! Two instances back the workflow: one for the published site and one for
//! staged drafts. The store only ever touches paths inside its root; callers
//! hand it relative paths which are validated before any filesystem access.

use crate::error::{Result, StagehandError};
use crate::io::atomic_write;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    /// Subdirectories skipped by `read_all`. Used when one store's root is
    /// nested inside another's (staged drafts under the published tree).
    excluded: Vec<PathBuf>,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
        }
    }

    /// Exclude a directory subtree from `read_all` enumeration.
    pub fn with_excluded(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a caller-supplied relative path and join it onto the root.
    /// Absolute paths, empty paths, and `..` components are rejected.
    fn resolve(&self, rel: &str) -> Result<PathBuf> {
        let path = Path::new(rel);
        if rel.is_empty() || path.is_absolute() {
            return Err(StagehandError::InvalidPath(rel.to_string()));
        }
        for component in path.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(StagehandError::InvalidPath(rel.to_string())),
            }
        }
        Ok(self.root.join(path))
    }

    /// Recursively read every file under the root whose extension is in
    /// `extensions`, returning relative path → body. Files that are not
    /// valid UTF-8 are skipped with a warning. A missing root reads as empty.
    pub fn read_all(&self, extensions: &[String]) -> Result<BTreeMap<String, String>> {
        let mut files = BTreeMap::new();
        if !self.root.exists() {
            return Ok(files);
        }
        self.visit(&self.root, extensions, &mut files)?;
        Ok(files)
    }

    fn visit(
        &self,
        dir: &Path,
        extensions: &[String],
        files: &mut BTreeMap<String, String>,
    ) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                if self.excluded.iter().any(|ex| ex == &path) {
                    continue;
                }
                self.visit(&path, extensions, files)?;
                continue;
            }
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|want| want == e));
            if !matches {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(body) => {
                    // Relative path is always derivable: we only walk under root.
                    if let Ok(rel) = path.strip_prefix(&self.root) {
                        files.insert(rel.to_string_lossy().into_owned(), body);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                }
            }
        }
        Ok(())
    }

    /// Write the full body at `rel`, creating parent directories as needed.
    /// The write is atomic: no partially-written file is ever visible.
    pub fn write(&self, rel: &str, body: &str) -> Result<()> {
        let path = self.resolve(rel)?;
        atomic_write(&path, body.as_bytes())
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.resolve(rel)?;
        Ok(std::fs::read_to_string(path)?)
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.resolve(rel).map(|p| p.exists()).unwrap_or(false)
    }

    /// Best-effort delete. A missing file is not an error.
    pub fn remove(&self, rel: &str) {
        if let Ok(path) = self.resolve(rel) {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove staged file");
                }
            }
        }
    }
}
