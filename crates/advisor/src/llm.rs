use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use agrilink_core::config::LlmConfig;

/// One chat-completion call: a system instruction, a user message, and the
/// sampling parameters for this operation.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// Groq chat-completion client (OpenAI-compatible wire format).
pub struct GroqClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GroqClient {
    /// Returns `None` when no api key is configured; callers degrade to the
    /// heuristic path instead of carrying a client that can only fail.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else { return Ok(None) };
        if api_key.expose_secret().trim().is_empty() {
            return Ok(None);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;

        Ok(Some(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user}
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens
        });

        debug!(event_name = "advisor.llm.request", model = %self.model, "chat completion call");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&body)
            .send()
            .await
            .context("llm request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("llm api returned {status}: {detail}"));
        }

        let payload: serde_json::Value =
            response.json().await.context("llm response was not json")?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("llm response carried no message content"))?;

        Ok(content.to_owned())
    }
}
