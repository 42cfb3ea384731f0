//! HTTP completion client for OpenAI-compatible chat endpoints.
//!
//! Talks to `{base_url}/v1/chat/completions` with bearer authentication.
//! Construction fails fast when the configured API key is absent; per-call
//! failures surface as `RevuError::Llm` for the caller to recover locally.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use revu_core::config::LlmConfig;
use revu_core::error::{Result, RevuError};

use crate::completion::{Completion, CompletionService};

const DEFAULT_SYSTEM: &str = "You are a helpful and concise assistant.";

/// Completion client for an OpenAI-compatible chat-completions API.
pub struct HttpCompletionClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f64,
    api_key: String,
}

impl HttpCompletionClient {
    /// Build a client from configuration, reading the API key from the
    /// configured environment variable.
    ///
    /// Missing or non-ASCII keys are configuration failures and abort
    /// startup; HTTP headers only admit ISO-8859-1, so a non-ASCII value
    /// can never be a real key.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| RevuError::Config(format!("{} is not set", config.api_key_env)))?;
        if !api_key.is_ascii() {
            return Err(RevuError::Config(format!(
                "{} contains non-ASCII characters; set a real API key",
                config.api_key_env
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RevuError::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
        })
    }

    async fn send(&self, system: &str, prompt: &str) -> Result<Completion> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: system,
                },
                WireMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RevuError::Llm(format!("completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RevuError::Llm(format!(
                "completion request returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RevuError::Llm(format!("completion response decode failed: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RevuError::Llm("completion response had no choices".to_string()))?;

        Ok(Completion::new(text))
    }
}

#[async_trait]
impl CompletionService for HttpCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        self.send(DEFAULT_SYSTEM, prompt).await
    }

    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<Completion> {
        self.send(system, prompt).await
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_env(var: &str) -> LlmConfig {
        LlmConfig {
            api_key_env: var.to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = config_with_env("REVU_TEST_MISSING_KEY");
        std::env::remove_var("REVU_TEST_MISSING_KEY");
        let result = HttpCompletionClient::from_config(&config);
        assert!(matches!(result, Err(RevuError::Config(_))));
    }

    #[test]
    fn test_non_ascii_api_key_rejected() {
        let config = config_with_env("REVU_TEST_NON_ASCII_KEY");
        std::env::set_var("REVU_TEST_NON_ASCII_KEY", "키-값");
        let result = HttpCompletionClient::from_config(&config);
        assert!(matches!(result, Err(RevuError::Config(_))));
        std::env::remove_var("REVU_TEST_NON_ASCII_KEY");
    }

    #[test]
    fn test_valid_key_builds_client() {
        let config = config_with_env("REVU_TEST_VALID_KEY");
        std::env::set_var("REVU_TEST_VALID_KEY", "sk-test-123");
        let client = HttpCompletionClient::from_config(&config).unwrap();
        assert_eq!(client.model, "solar-1-mini-chat");
        assert_eq!(client.base_url, "https://api.upstage.ai");
        std::env::remove_var("REVU_TEST_VALID_KEY");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mut config = config_with_env("REVU_TEST_SLASH_KEY");
        config.base_url = "https://api.example.com/".to_string();
        std::env::set_var("REVU_TEST_SLASH_KEY", "sk-test");
        let client = HttpCompletionClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
        std::env::remove_var("REVU_TEST_SLASH_KEY");
    }

    #[test]
    fn test_response_decode() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"rag_review"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "rag_review");
    }

    #[test]
    fn test_response_decode_empty_choices() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
