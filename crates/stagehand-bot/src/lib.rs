//! `stagehand-bot` — Telegram front end for the staging workflow.
//!
//! Inbound messages are parsed into commands ([`command`]), authorized and
//! dispatched into the core workflow ([`handler`]), and replies go back out
//! through a minimal Bot API client ([`telegram`]).

pub mod command;
pub mod completion;
pub mod handler;
pub mod telegram;

pub use command::Command;
pub use completion::ClaudeCompletion;
pub use handler::Handler;
pub use telegram::TelegramClient;
