//! `claude-client` — typed client for the Anthropic Messages API.
//!
//! One operation: [`ClaudeClient::complete`] sends system instructions plus a
//! single user message and returns the response text. Each call is stateless;
//! no conversation history is kept. Errors carry the API's own diagnostic
//! message and nothing is retried here.

pub mod error;
pub mod types;

pub use error::ClaudeClientError;
pub use types::{ContentBlock, MessageParam, MessagesRequest, MessagesResponse};

use std::time::Duration;
use tracing::debug;

pub type Result<T> = std::result::Result<T, ClaudeClientError>;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Output budget per completion. Full site files come back in one response,
/// so this sits at the 8k-token class the API supports.
const DEFAULT_MAX_TOKENS: u32 = 8_192;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Point the client at a different endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// One stateless completion: system instructions + user message → text.
    ///
    /// Non-2xx responses are decoded into the API's error envelope and
    /// surfaced verbatim. A response without any text block is an error.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(system.to_string()),
            messages: vec![MessageParam::user(user)],
        };

        debug!(model = %self.model, "sending messages request");
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<types::ErrorEnvelope>(&body) {
                Ok(envelope) => format!("{}: {}", envelope.error.kind, envelope.error.message),
                Err(_) => body,
            };
            return Err(ClaudeClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        let text: String = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Unknown => None,
            })
            .collect();

        if text.is_empty() {
            return Err(ClaudeClientError::EmptyResponse);
        }
        Ok(text)
    }
}
