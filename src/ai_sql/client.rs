//! AI provider client implementations

use crate::ai_sql::config::{AiProviderType, AiSqlConfig};
use crate::ai_sql::error::{AiError, AiResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A text-generation service that answers a prompt with free text
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> AiResult<String>;

    /// Get provider name
    fn name(&self) -> &str;
}

fn build_http_client(timeout_secs: u64) -> AiResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AiError::NetworkError(format!("Failed to create HTTP client: {}", e)))
}

fn map_request_error(e: reqwest::Error, timeout_secs: u64) -> AiError {
    if e.is_timeout() {
        AiError::TimeoutError { timeout_secs }
    } else {
        AiError::NetworkError(format!("Request failed: {}", e))
    }
}

async fn ensure_success(response: reqwest::Response) -> AiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AiError::ApiError {
        status_code: status.as_u16(),
        message: error_text,
    })
}

/// Google Gemini provider (`generateContent` REST API)
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiProvider {
    pub fn new(api_key: String, base_url: String, model: String, timeout_secs: u64) -> AiResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Pull the generated text out of a `generateContent` response
    pub fn parse_response(json: &Value) -> AiResult<String> {
        json.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                let reason = json
                    .pointer("/promptFeedback/blockReason")
                    .and_then(Value::as_str)
                    .map(|r| format!(" (blocked: {r})"))
                    .unwrap_or_default();
                AiError::ProviderError(format!("No text in Gemini response{reason}"))
            })
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> AiResult<String> {
        debug!(
            "Calling Gemini API with model: {}, prompt length: {} chars",
            self.model,
            prompt.len()
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout_secs))?;

        let response_body: Value = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AiError::ProviderError(format!("Failed to parse API response: {}", e)))?;

        Self::parse_response(&response_body)
    }

    fn name(&self) -> &str {
        "Google Gemini"
    }
}

/// Anthropic Claude provider (Messages API)
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    timeout_secs: u64,
}

impl AnthropicProvider {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> AiResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            max_tokens,
            timeout_secs,
        })
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    async fn generate(&self, prompt: &str) -> AiResult<String> {
        let url = format!("{}/v1/messages", self.base_url);

        let request_body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.0,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!(
            "Calling Anthropic API with model: {}, max_tokens: {}",
            self.model, self.max_tokens
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout_secs))?;

        let response_body: AnthropicResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AiError::ProviderError(format!("Failed to parse API response: {}", e)))?;

        response_body
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| AiError::ProviderError("No content in response".to_string()))
    }

    fn name(&self) -> &str {
        "Anthropic Claude"
    }
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Create AI client based on configuration
pub fn create_ai_client(config: &AiSqlConfig) -> AiResult<Arc<dyn AiProvider>> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        AiError::ConfigurationError(
            "API key not configured. Set the API_KEY environment variable or add api_key to [ai_sql]."
                .to_string(),
        )
    })?;

    match config.provider {
        AiProviderType::Gemini => Ok(Arc::new(GeminiProvider::new(
            api_key,
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
            config.timeout_seconds,
        )?)),
        AiProviderType::Anthropic => Ok(Arc::new(AnthropicProvider::new(
            api_key,
            config.anthropic_base_url.clone(),
            config.anthropic_model.clone(),
            config.max_tokens,
            config.timeout_seconds,
        )?)),
    }
}
