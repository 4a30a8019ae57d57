use super::{ChatMessage, ChatModel, ChatRole, Generation, Llm, LlmResult};
use crate::trace::Callbacks;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions model, usable both as a bare [`Llm`] (each prompt
/// sent as a single user message) and as a [`ChatModel`].
pub struct OpenAiModel {
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiModel {
    pub fn new(model: String, api_key: String, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model,
            api_key,
            temperature,
            max_tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from environment (`OPENAI_API_KEY`, optional `OPENAI_BASE_URL`).
    pub fn from_env(model: String, temperature: f32, max_tokens: u32) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
        let mut this = Self::new(model, api_key, temperature, max_tokens);
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            this = this.with_base_url(url);
        }
        Ok(this)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn complete(
        &self,
        messages: Vec<serde_json::Value>,
    ) -> anyhow::Result<(Generation, serde_json::Value)> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        debug!(url = %url, model = %self.model, "chat completion request");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "OpenAI chat API error (status {}): {}",
                status.as_u16(),
                error_text
            );
        }

        let json: serde_json::Value = resp.json().await?;
        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API response missing content"))?
            .to_string();
        let finish_reason = json.pointer("/choices/0/finish_reason").cloned();
        let usage = json.get("usage").cloned().unwrap_or_else(|| json!({}));

        let generation = Generation {
            message: Some(ChatMessage::new(ChatRole::Ai, text.clone())),
            text,
            generation_info: finish_reason.map(|r| json!({ "finish_reason": r })),
        };
        Ok((generation, usage))
    }

    async fn run_all(&self, requests: Vec<Vec<serde_json::Value>>) -> anyhow::Result<LlmResult> {
        let mut generations = Vec::with_capacity(requests.len());
        let mut prompt_tokens = 0u64;
        let mut completion_tokens = 0u64;
        for messages in requests {
            let (generation, usage) = self.complete(messages).await?;
            prompt_tokens += usage.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
            completion_tokens += usage
                .get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            generations.push(vec![generation]);
        }
        Ok(LlmResult {
            generations,
            llm_output: Some(json!({
                "model_name": self.model,
                "token_usage": {
                    "prompt_tokens": prompt_tokens,
                    "completion_tokens": completion_tokens,
                    "total_tokens": prompt_tokens + completion_tokens,
                }
            })),
        })
    }
}

fn wire_role(role: &ChatRole) -> &str {
    match role {
        ChatRole::Human => "user",
        ChatRole::Ai => "assistant",
        ChatRole::System => "system",
        ChatRole::Other(role) => role,
    }
}

#[async_trait]
impl Llm for OpenAiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompts: &[String],
        _callbacks: Callbacks<'_>,
    ) -> anyhow::Result<LlmResult> {
        let requests: Vec<Vec<serde_json::Value>> = prompts
            .iter()
            .map(|p| vec![json!({ "role": "user", "content": p })])
            .collect();
        self.run_all(requests).await
    }
}

#[async_trait]
impl ChatModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        conversations: &[Vec<ChatMessage>],
        _callbacks: Callbacks<'_>,
    ) -> anyhow::Result<LlmResult> {
        let requests: Vec<Vec<serde_json::Value>> = conversations
            .iter()
            .map(|c| {
                c.iter()
                    .map(|m| json!({ "role": wire_role(&m.role), "content": m.content }))
                    .collect::<Vec<_>>()
            })
            .collect();
        self.run_all(requests).await
    }
}
