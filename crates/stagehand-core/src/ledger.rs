//! Durable record of what was already deployed.
//!
//! A single JSON array on disk, most-recent entry last, capped at
//! [`LEDGER_CAP`] entries. Every check and record re-reads the file, so a
//! restart loses nothing; concurrent writers are not supported (the bot
//! serializes all mutations through its single update loop).

use crate::error::Result;
use crate::io::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::warn;

/// Maximum retained entries; oldest are evicted first.
pub const LEDGER_CAP: usize = 50;

/// Prompts are summarized to this many characters when recorded.
const PROMPT_SUMMARY_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub file: String,
    pub hash: String,
    pub prompt: String,
    pub timestamp: DateTime<Utc>,
}

/// Compute the content fingerprint of an artifact body: SHA-256, lowercase hex.
pub fn fingerprint(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[derive(Debug, Clone)]
pub struct DeployLedger {
    path: PathBuf,
}

impl DeployLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load all retained entries. A missing or corrupt backing file reads as
    /// an empty ledger; only write failures surface to callers.
    pub fn load(&self) -> Vec<LedgerEntry> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ledger unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&data) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ledger corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// True iff some retained entry matches both the file and the fingerprint.
    pub fn was_deployed(&self, file: &str, hash: &str) -> bool {
        self.load()
            .iter()
            .any(|entry| entry.file == file && entry.hash == hash)
    }

    /// Append one entry with the current timestamp, then truncate to the
    /// last [`LEDGER_CAP`] entries.
    pub fn record(&self, file: &str, hash: &str, prompt: &str) -> Result<()> {
        let mut entries = self.load();
        entries.push(LedgerEntry {
            file: file.to_string(),
            hash: hash.to_string(),
            prompt: summarize(prompt),
            timestamp: Utc::now(),
        });
        if entries.len() > LEDGER_CAP {
            entries.drain(..entries.len() - LEDGER_CAP);
        }
        let data = serde_json::to_string_pretty(&entries)?;
        atomic_write(&self.path, data.as_bytes())
    }

    /// The most recent `n` entries, newest last.
    pub fn recent(&self, n: usize) -> Vec<LedgerEntry> {
        let entries = self.load();
        let skip = entries.len().saturating_sub(n);
        entries.into_iter().skip(skip).collect()
    }
}

/// Truncate a prompt to a summary on a char boundary.
fn summarize(prompt: &str) -> String {
    prompt.chars().take(PROMPT_SUMMARY_CHARS).collect()
}
