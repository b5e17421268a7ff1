use super::LanguageModel;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::prelude::*;
use rig::providers::openai;
use std::time::Duration;
use tracing::debug;

/// OpenAI chat model; every call builds a fresh single-turn agent.
pub struct OpenAiChatModel {
    client: openai::Client,
    model: String,
    timeout: Duration,
}

impl OpenAiChatModel {
    pub fn new(api_key: &str, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: openai::Client::new(api_key),
            model: model.into(),
            timeout,
        }
    }

    /// Same as `new` but against any OpenAI-compatible endpoint.
    pub fn with_base_url(
        api_key: &str,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: openai::Client::from_url(api_key, base_url),
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    async fn complete(&self, instructions: &str, input: &str) -> Result<String> {
        let agent = self.client.agent(&self.model).preamble(instructions).build();
        let prompt = input.to_string();

        debug!(model = %self.model, input_chars = prompt.len(), "Sending completion request");
        let reply = tokio::time::timeout(self.timeout, agent.prompt(&prompt))
            .await
            .map_err(|_| anyhow!("Model call timed out after {:?}", self.timeout))?
            .map_err(|e| anyhow!("Prompt error: {}", e))?;

        Ok(reply)
    }
}
