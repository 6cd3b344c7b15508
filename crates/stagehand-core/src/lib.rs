//! `stagehand-core` — the staging workflow behind the stagehand bot.
//!
//! A conversation asks for a content change; the workflow reads the current
//! published site, asks the text-generation service for a full replacement
//! body, stages it under a dev directory, and waits for an explicit yes/no
//! before committing and pushing. A deploy ledger remembers recent
//! (file, fingerprint) pairs so identical content is never published twice.
//!
//! ```text
//! StageRequest
//!     │
//!     ▼
//! Stagehand::stage   ← context from ContentStore (published root)
//!     │                body from TextCompletion, checked against DeployLedger
//!     ▼
//! PENDING            ← draft written to the staged root
//!     │
//!     ├─ confirm → copy to published root → Publisher (push) → ledger → IDLE
//!     └─ cancel  → staged draft removed → IDLE
//! ```
//!
//! The transport (Telegram) and the text service (Anthropic API) live in
//! sibling crates; this crate only sees them through the [`TextCompletion`]
//! and [`Publisher`] traits.

pub mod config;
pub mod error;
pub mod generate;
pub mod io;
pub mod ledger;
pub mod normalize;
pub mod publish;
pub mod session;
pub mod store;

pub use config::StagehandConfig;
pub use error::{Result, StagehandError};
pub use generate::TextCompletion;
pub use ledger::{fingerprint, DeployLedger, LedgerEntry, LEDGER_CAP};
pub use publish::{GitPublisher, PublishOutcome, Publisher};
pub use session::{
    chunk_text, ConfirmOutcome, DiffEntry, FileSummary, PendingChange, SessionStore, StageOutcome,
    StageRequest, Stagehand, StatusReport, CHUNK_CHARS, PREVIEW_CHARS,
};
pub use store::ContentStore;
