//! Bridges the Anthropic client into the workflow's generation seam.

use async_trait::async_trait;
use claude_client::ClaudeClient;
use stagehand_core::{Result, StagehandError, TextCompletion};

pub struct ClaudeCompletion {
    client: ClaudeClient,
}

impl ClaudeCompletion {
    pub fn new(client: ClaudeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextCompletion for ClaudeCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.client
            .complete(system, user)
            .await
            .map_err(|e| StagehandError::Generation(e.to_string()))
    }
}
