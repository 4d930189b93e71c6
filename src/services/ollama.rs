//! Ollama API client for LLM-based classification
//!
//! Thin wrapper over the non-streaming `/api/generate` endpoint. Answer
//! interpretation lives in the classifier; this module only moves text.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the Ollama service
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// A text generation backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`. Transport failures and non-2xx
    /// statuses are errors.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Request body for Ollama generate API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    total_duration: u64,
    #[serde(default)]
    eval_count: u32,
}

/// Service for interacting with Ollama API
pub struct OllamaService {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaService {
    /// Create a new OllamaService with the given configuration
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// List models installed on the server; used as a startup reachability check
    pub async fn test_connection(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.config.url);

        #[derive(Deserialize)]
        struct TagsResponse {
            models: Vec<ModelInfo>,
        }

        #[derive(Deserialize)]
        struct ModelInfo {
            name: String,
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to Ollama server")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama server returned status: {}", response.status());
        }

        let tags: TagsResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LanguageModel for OllamaService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", self.config.url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error: {} - {}", status, body);
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        debug!(
            model = %self.config.model,
            duration_ms = ollama_response.total_duration / 1_000_000,
            tokens = ollama_response.eval_count,
            "Ollama generation finished"
        );

        Ok(ollama_response.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OllamaConfig::default();
        assert_eq!(config.url, "http://localhost:11434");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(OllamaRequest {
            model: "llama3.2",
            prompt: "Is it?",
            stream: false,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "llama3.2", "prompt": "Is it?", "stream": false})
        );
    }

    #[test]
    fn test_response_missing_field_is_empty() {
        let parsed: OllamaResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(parsed.response.is_empty());
    }
}
