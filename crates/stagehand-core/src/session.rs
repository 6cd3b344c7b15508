//! The staging workflow state machine.
//!
//! Each conversation is either idle or holds exactly one [`PendingChange`].
//! A stage request takes an idle conversation to pending; confirm and cancel
//! take it back. While pending, further stage requests are rejected, never
//! silently replaced.
//!
//! [`Stagehand`] ties the pieces together: it reads published content for
//! context, calls the generator, consults the deploy ledger, writes staged
//! drafts, and drives the publisher on confirm.

use crate::config::StagehandConfig;
use crate::error::{Result, StagehandError};
use crate::generate::{self, TextCompletion};
use crate::ledger::{fingerprint, DeployLedger, LedgerEntry};
use crate::publish::{PublishOutcome, Publisher};
use crate::store::ContentStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::info;

/// Characters of the staged body shown in the post-stage preview.
pub const PREVIEW_CHARS: usize = 800;

/// Maximum characters per preview segment, sized under the ~4,096-char
/// transport message limit with room for formatting.
pub const CHUNK_CHARS: usize = 3_900;

/// Commit messages carry at most this much of the originating prompt.
const COMMIT_PROMPT_CHARS: usize = 60;

// ---------------------------------------------------------------------------
// Pending state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PendingChange {
    pub file: String,
    pub hash: String,
    pub prompt: String,
    pub staged_at: DateTime<Utc>,
}

/// Per-conversation pending slots. At most one pending change per key.
#[derive(Debug, Default)]
pub struct SessionStore {
    pending: HashMap<i64, PendingChange>,
}

impl SessionStore {
    pub fn get(&self, conversation: i64) -> Option<&PendingChange> {
        self.pending.get(&conversation)
    }

    pub fn is_pending(&self, conversation: i64) -> bool {
        self.pending.contains_key(&conversation)
    }

    fn insert(&mut self, conversation: i64, change: PendingChange) {
        self.pending.insert(conversation, change);
    }

    fn take(&mut self, conversation: i64) -> Option<PendingChange> {
        self.pending.remove(&conversation)
    }
}

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StageRequest {
    pub file: String,
    pub prompt: String,
    /// True for new-file requests; skips the published-set existence check.
    pub is_new: bool,
}

#[derive(Debug, Clone)]
pub enum StageOutcome {
    /// The draft was written to the staged root and awaits confirmation.
    Staged {
        file: String,
        size: usize,
        preview: String,
    },
    /// Identical content was already published; nothing was staged and the
    /// conversation stays idle.
    AlreadyDeployed { file: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Pushed { file: String },
    NothingToPush { file: String },
}

#[derive(Debug, Clone)]
pub struct FileSummary {
    pub file: String,
    pub chars: usize,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub published: Vec<FileSummary>,
    pub staged: Vec<FileSummary>,
    pub recent: Vec<LedgerEntry>,
    pub pending: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEntry {
    Identical { file: String },
    Modified {
        file: String,
        published_chars: usize,
        staged_chars: usize,
    },
    New { file: String, staged_chars: usize },
}

// ---------------------------------------------------------------------------
// Stagehand
// ---------------------------------------------------------------------------

pub struct Stagehand {
    published: ContentStore,
    staged: ContentStore,
    ledger: DeployLedger,
    completion: Box<dyn TextCompletion>,
    publisher: Box<dyn Publisher>,
    sessions: SessionStore,
    extensions: Vec<String>,
    style_notes: Option<String>,
}

impl Stagehand {
    pub fn new(
        config: &StagehandConfig,
        completion: Box<dyn TextCompletion>,
        publisher: Box<dyn Publisher>,
    ) -> Self {
        let staged_root = config.staged_root();
        // The staged root may live inside the published tree; keep drafts out
        // of the published enumeration.
        let published = ContentStore::new(config.published_root()).with_excluded(&staged_root);
        Self {
            published,
            staged: ContentStore::new(staged_root),
            ledger: DeployLedger::new(config.ledger_path()),
            completion,
            publisher,
            sessions: SessionStore::default(),
            extensions: config.extensions.clone(),
            style_notes: config.style_notes.clone(),
        }
    }

    pub fn is_pending(&self, conversation: i64) -> bool {
        self.sessions.is_pending(conversation)
    }

    pub fn pending(&self, conversation: i64) -> Option<&PendingChange> {
        self.sessions.get(conversation)
    }

    /// Generate a change and stage it, entering the pending state.
    ///
    /// Fails with `PendingUnresolved` if this conversation already has a
    /// pending change, and with `TargetNotFound` if an edit names a file
    /// absent from the published set. Returns `AlreadyDeployed` without
    /// staging anything when the generated content matches a ledger entry.
    pub async fn stage(&mut self, conversation: i64, request: StageRequest) -> Result<StageOutcome> {
        if self.sessions.is_pending(conversation) {
            return Err(StagehandError::PendingUnresolved);
        }

        let site_files = self.published.read_all(&self.extensions)?;
        if !request.is_new && !site_files.contains_key(&request.file) {
            return Err(StagehandError::TargetNotFound {
                file: request.file,
                available: site_files.keys().cloned().collect(),
            });
        }

        let body = generate::generate(
            self.completion.as_ref(),
            &request.prompt,
            &request.file,
            &site_files,
            self.style_notes.as_deref(),
        )
        .await?;

        let hash = fingerprint(&body);
        if self.ledger.was_deployed(&request.file, &hash) {
            info!(file = %request.file, "content already deployed, skipping");
            return Ok(StageOutcome::AlreadyDeployed { file: request.file });
        }

        self.staged.write(&request.file, &body)?;
        let size = body.chars().count();
        let preview = preview_of(&body);
        info!(file = %request.file, size, "staged draft");

        self.sessions.insert(
            conversation,
            PendingChange {
                file: request.file.clone(),
                hash,
                prompt: request.prompt,
                staged_at: Utc::now(),
            },
        );

        Ok(StageOutcome::Staged {
            file: request.file,
            size,
            preview,
        })
    }

    /// Publish the pending change: the staged body is copied into the
    /// published root, then the publisher commits and pushes. The copy runs
    /// first so the publish picks it up. The pending slot is cleared whether
    /// or not the publish succeeds; a failed publish is reported and the user
    /// re-issues the request.
    pub fn confirm(&mut self, conversation: i64) -> Result<ConfirmOutcome> {
        let pending = self
            .sessions
            .take(conversation)
            .ok_or(StagehandError::NothingPending)?;

        let body = self.staged.read(&pending.file)?;
        self.published.write(&pending.file, &body)?;

        let message = commit_message(&pending.prompt);
        let outcome = self.publisher.publish(&message)?;

        match outcome {
            PublishOutcome::Pushed => {
                self.ledger
                    .record(&pending.file, &pending.hash, &pending.prompt)?;
                info!(file = %pending.file, "published");
                Ok(ConfirmOutcome::Pushed { file: pending.file })
            }
            PublishOutcome::NothingToPush => {
                Ok(ConfirmOutcome::NothingToPush { file: pending.file })
            }
        }
    }

    /// Discard the pending change and delete its staged file (best effort).
    /// Returns the cancelled file path.
    pub fn cancel(&mut self, conversation: i64) -> Result<String> {
        let pending = self
            .sessions
            .take(conversation)
            .ok_or(StagehandError::NothingPending)?;
        self.staged.remove(&pending.file);
        info!(file = %pending.file, "cancelled pending change");
        Ok(pending.file)
    }

    /// The full staged body of the pending change, chunked for transport.
    pub fn preview(&self, conversation: i64) -> Result<Vec<String>> {
        let pending = self
            .sessions
            .get(conversation)
            .ok_or(StagehandError::NothingPending)?;
        let body = self.staged.read(&pending.file)?;
        Ok(chunk_text(&body, CHUNK_CHARS))
    }

    /// Published and staged file listings plus recent deploys.
    pub fn status(&self, conversation: i64) -> Result<StatusReport> {
        let published = summarize_files(self.published.read_all(&self.extensions)?);
        let staged = summarize_files(self.staged.read_all(&self.extensions)?);
        Ok(StatusReport {
            published,
            staged,
            recent: self.ledger.recent(5),
            pending: self.sessions.get(conversation).map(|p| p.file.clone()),
        })
    }

    /// Byte-equality comparison of staged drafts against published content.
    pub fn diff(&self) -> Result<Vec<DiffEntry>> {
        let published = self.published.read_all(&self.extensions)?;
        let staged = self.staged.read_all(&self.extensions)?;
        let mut entries = Vec::with_capacity(staged.len());
        for (file, staged_body) in &staged {
            match published.get(file) {
                Some(published_body) if published_body == staged_body => {
                    entries.push(DiffEntry::Identical { file: file.clone() });
                }
                Some(published_body) => entries.push(DiffEntry::Modified {
                    file: file.clone(),
                    published_chars: published_body.chars().count(),
                    staged_chars: staged_body.chars().count(),
                }),
                None => entries.push(DiffEntry::New {
                    file: file.clone(),
                    staged_chars: staged_body.chars().count(),
                }),
            }
        }
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn summarize_files(files: std::collections::BTreeMap<String, String>) -> Vec<FileSummary> {
    files
        .into_iter()
        .map(|(file, body)| FileSummary {
            file,
            chars: body.chars().count(),
        })
        .collect()
}

fn commit_message(prompt: &str) -> String {
    let summary: String = prompt.chars().take(COMMIT_PROMPT_CHARS).collect();
    format!("stagehand deploy: {summary}")
}

fn preview_of(body: &str) -> String {
    let mut preview: String = body.chars().take(PREVIEW_CHARS).collect();
    if body.chars().count() > PREVIEW_CHARS {
        preview.push_str("\n...");
    }
    preview
}

/// Split text into ordered segments of at most `max_chars` characters.
/// Splits on character boundaries; used for transport-limited delivery.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
