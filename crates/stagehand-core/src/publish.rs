//! Publish operation: commit and push staged content via git.
//!
//! The [`Publisher`] trait is the seam; [`GitPublisher`] is the real
//! implementation shelling out to `git`. Each step (stage-all, status check,
//! commit, push) fails independently and nothing is retried.

use crate::error::{Result, StagehandError};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Committed and pushed to the configured remote/branch.
    Pushed,
    /// The working tree had no changes; nothing was committed.
    NothingToPush,
}

pub trait Publisher: Send + Sync {
    fn publish(&self, message: &str) -> Result<PublishOutcome>;
}

#[derive(Debug, Clone)]
pub struct GitPublisher {
    repo_root: PathBuf,
    remote: String,
    branch: String,
}

impl GitPublisher {
    pub fn new(repo_root: impl Into<PathBuf>, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    /// Run one git subcommand in the repo root, capturing output.
    /// Non-zero exit becomes a `Publish` error carrying stderr.
    fn git(&self, args: &[&str]) -> Result<String> {
        debug!(?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|e| StagehandError::Publish(format!("failed to run git: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StagehandError::Publish(format!(
                "git {} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Publisher for GitPublisher {
    fn publish(&self, message: &str) -> Result<PublishOutcome> {
        self.git(&["add", "-A"])?;
        let status = self.git(&["status", "--porcelain"])?;
        if status.trim().is_empty() {
            return Ok(PublishOutcome::NothingToPush);
        }
        self.git(&["commit", "-m", message])?;
        self.git(&["push", &self.remote, &self.branch])?;
        info!(remote = %self.remote, branch = %self.branch, "pushed");
        Ok(PublishOutcome::Pushed)
    }
}
