//! Minimal Telegram Bot API client: long polling in, Markdown messages out.
//!
//! Only the two methods the bot needs (`getUpdates`, `sendMessage`) are
//! wrapped. Replies longer than the transport's message limit are split into
//! ordered chunks before sending.

use serde::Deserialize;
use stagehand_core::chunk_text;
use thiserror::Error;
use tracing::debug;

/// Telegram caps messages at 4,096 characters. Preview segments arrive at
/// 3,900 chars plus fence markers, so this must sit above that but under
/// the cap.
const MESSAGE_CHUNK_CHARS: usize = 4_000;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, TelegramError>;

// ─── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

// ─── Client ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(format!("https://api.telegram.org/bot{token}"))
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    /// Long-poll for updates after `offset`. Blocks server-side for up to
    /// `timeout_secs` when no updates are waiting.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let response: ApiResponse<Vec<Update>> = self
            .http
            .get(format!("{}/getUpdates", self.base))
            .query(&[("offset", offset.to_string()), ("timeout", timeout_secs.to_string())])
            .send()
            .await?
            .json()
            .await?;
        if !response.ok {
            return Err(TelegramError::Api(
                response.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(response.result.unwrap_or_default())
    }

    /// Send one Markdown-formatted message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        debug!(chat_id, chars = text.chars().count(), "sending message");
        let response: ApiResponse<serde_json::Value> = self
            .http
            .post(format!("{}/sendMessage", self.base))
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await?
            .json()
            .await?;
        if !response.ok {
            return Err(TelegramError::Api(
                response.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }

    /// Send text of any length, splitting into ordered chunks under the
    /// transport limit.
    pub async fn send_chunked(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in chunk_text(text, MESSAGE_CHUNK_CHARS) {
            self.send_message(chat_id, &chunk).await?;
        }
        Ok(())
    }
}
