//! Configuration for AI SQL generation

use crate::ai_sql::schema::{SchemaDescriptor, TableDescriptor};
use serde::{Deserialize, Serialize};

/// AI provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderType {
    #[default]
    Gemini,
    Anthropic,
}

/// Configuration for AI SQL generation
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSqlConfig {
    /// AI provider to use
    pub provider: AiProviderType,

    /// API key for the selected provider (can also use API_KEY env var)
    pub api_key: Option<String>,

    // === Gemini Configuration ===
    pub gemini_model: String,
    pub gemini_base_url: String,

    // === Anthropic Configuration ===
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Only let single read statements reach the database
    pub read_only: bool,

    /// Tables described to the model; empty means the built-in schema
    pub schema: Vec<TableDescriptor>,
}

impl Default for AiSqlConfig {
    fn default() -> Self {
        Self {
            provider: AiProviderType::Gemini,
            api_key: None,

            gemini_model: "gemini-1.5-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),

            anthropic_model: "claude-sonnet-4-5-20250929".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 1024,

            timeout_seconds: 30,
            read_only: false,
            schema: Vec::new(),
        }
    }
}

impl std::fmt::Debug for AiSqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiSqlConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("anthropic_model", &self.anthropic_model)
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("read_only", &self.read_only)
            .field("schema", &self.schema)
            .finish()
    }
}

impl AiSqlConfig {
    /// Pick up the API key from the environment.
    ///
    /// `API_KEY` wins, then the provider specific variable.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider_var = match self.provider {
            AiProviderType::Gemini => "GEMINI_API_KEY",
            AiProviderType::Anthropic => "ANTHROPIC_API_KEY",
        };

        if let Some(key) = lookup("API_KEY").or_else(|| lookup(provider_var)) {
            self.api_key = Some(key);
        }
    }

    /// Schema descriptor to embed in prompts
    pub fn schema_descriptor(&self) -> Result<SchemaDescriptor, String> {
        if self.schema.is_empty() {
            return Ok(SchemaDescriptor::default());
        }
        SchemaDescriptor::new(self.schema.clone()).map_err(|e| e.to_string())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_seconds == 0 {
            return Err("ai_sql.timeout_seconds must be greater than 0".to_string());
        }

        if self.max_tokens == 0 {
            return Err("ai_sql.max_tokens must be greater than 0".to_string());
        }

        let (model, base_url) = match self.provider {
            AiProviderType::Gemini => (&self.gemini_model, &self.gemini_base_url),
            AiProviderType::Anthropic => (&self.anthropic_model, &self.anthropic_base_url),
        };
        if model.trim().is_empty() {
            return Err("ai_sql model name must not be empty".to_string());
        }
        if base_url.trim().is_empty() {
            return Err("ai_sql base URL must not be empty".to_string());
        }

        self.schema_descriptor().map(|_| ())
    }
}
