use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Filesystem and git layout for one managed site.
///
/// All relative fields are resolved against `repo_root`. The defaults match
/// a static site served from `public_html/` with staged drafts kept in a
/// `dev/` subdirectory of it, and the deploy ledger hidden at the repo root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagehandConfig {
    pub repo_root: PathBuf,

    #[serde(default = "default_published_dir")]
    pub published_dir: String,

    #[serde(default = "default_staged_dir")]
    pub staged_dir: String,

    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// File edited when a request names no target.
    #[serde(default = "default_target")]
    pub default_target: String,

    /// Extensions considered site content when reading context.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Optional brand/style guidance appended to the generation instructions.
    #[serde(default)]
    pub style_notes: Option<String>,
}

fn default_published_dir() -> String {
    "public_html".to_string()
}

fn default_staged_dir() -> String {
    "public_html/dev".to_string()
}

fn default_ledger_file() -> String {
    ".deploy_log.json".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_target() -> String {
    "index.html".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["html".to_string(), "css".to_string(), "js".to_string()]
}

impl StagehandConfig {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            published_dir: default_published_dir(),
            staged_dir: default_staged_dir(),
            ledger_file: default_ledger_file(),
            remote: default_remote(),
            branch: default_branch(),
            default_target: default_target(),
            extensions: default_extensions(),
            style_notes: None,
        }
    }

    pub fn published_root(&self) -> PathBuf {
        self.repo_root.join(&self.published_dir)
    }

    pub fn staged_root(&self) -> PathBuf {
        self.repo_root.join(&self.staged_dir)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.repo_root.join(&self.ledger_file)
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}
