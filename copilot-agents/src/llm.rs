//! Text generation service.
//!
//! The writer and reviewer agents only see the [`TextGenerator`] trait. The
//! production implementation talks to any OpenAI-compatible chat completions
//! endpoint (Groq by default); [`Unavailable`] stands in when no key is set.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default chat model.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// A single role-scoped generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Role system instructions.
    pub system: &'a str,
    /// User content.
    pub content: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Sampling settings for a role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleProfile {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl RoleProfile {
    pub const WRITER: RoleProfile = RoleProfile {
        temperature: 0.75,
        max_tokens: 512,
    };
    pub const REVIEWER: RoleProfile = RoleProfile {
        temperature: 0.3,
        max_tokens: 256,
    };
}

/// Anything that can turn a role prompt into text.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, request: GenerationRequest<'a>) -> BoxFuture<'a, Result<String>>;
}

/// A message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Response from a chat completions endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl ApiResponse {
    /// Text of the first choice, or an empty string.
    pub fn text(&self) -> String {
        self.choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

/// OpenAI-compatible chat client.
pub struct LlmClient {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a conversation and get the raw response.
    pub async fn chat(
        &self,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<ApiResponse> {
        let body = serde_json::json!({
            "model": &self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to call chat completions API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Chat completions API error {status}: {body}");
        }

        resp.json::<ApiResponse>()
            .await
            .context("Failed to parse chat completions response")
    }

    /// Single-turn completion with a system prompt.
    pub async fn complete(&self, request: GenerationRequest<'_>) -> Result<String> {
        let messages = [Message::system(request.system), Message::user(request.content)];
        let resp = self
            .chat(&messages, request.temperature, request.max_tokens)
            .await?;
        if let Some(usage) = &resp.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }
        Ok(resp.text().trim().to_string())
    }
}

impl TextGenerator for LlmClient {
    fn generate<'a>(&'a self, request: GenerationRequest<'a>) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.complete(request))
    }
}

/// Null generator used when no service is configured. Every call fails, so
/// the agents fall back to their deterministic behaviour.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl TextGenerator for Unavailable {
    fn generate<'a>(&'a self, _request: GenerationRequest<'a>) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            Err::<String, _>(anyhow::anyhow!(
                "generation service unavailable: {}",
                self.reason
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_completion_payload() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  APPROVED \n"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 2, "total_tokens": 14}
        }"#;
        let resp: ApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.text().trim(), "APPROVED");
        assert_eq!(resp.usage.unwrap().completion_tokens, 2);
    }

    #[test]
    fn empty_choices_yield_empty_text() {
        let resp: ApiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(resp.text(), "");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = LlmClient::new("k".into())
            .with_base_url("http://localhost:8080/v1/")
            .with_model("tiny");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
        assert_eq!(client.model(), "tiny");
    }

    #[tokio::test]
    async fn unavailable_always_errors() {
        let llm = Unavailable::new("no key");
        let err = llm
            .generate(GenerationRequest {
                system: "s",
                content: "c",
                temperature: 0.5,
                max_tokens: 10,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no key"));
    }
}
