//! Error types for AI SQL generation and the query pipeline

use crate::database::DatabaseError;
use serde_json::{Value, json};
use thiserror::Error;

/// Result type for AI SQL operations
pub type AiResult<T> = Result<T, AiError>;

/// Errors that can occur while talking to a generation provider
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI provider error: {0}")]
    ProviderError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {status_code} - {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Timeout error: operation took longer than {timeout_secs}s")]
    TimeoutError { timeout_secs: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for one pass through the query pipeline
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure of a `/fetch-query` request, by stage
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("SQL generation failed: {0}")]
    GenerationFailed(#[source] AiError),

    #[error("SQL execution failed: {source}")]
    ExecutionFailed {
        sql: String,
        #[source]
        source: DatabaseError,
    },

    #[error("Server error: {0}")]
    ServerFault(String),
}

impl PipelineError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::InvalidInput(_) => 400,
            PipelineError::GenerationFailed(_)
            | PipelineError::ExecutionFailed { .. }
            | PipelineError::ServerFault(_) => 500,
        }
    }

    /// Stage name used in logs
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "input",
            PipelineError::GenerationFailed(_) => "generation",
            PipelineError::ExecutionFailed { .. } => "execution",
            PipelineError::ServerFault(_) => "server",
        }
    }

    /// JSON error body: `{ "error": ..., "details": ... }`
    pub fn to_body(&self) -> Value {
        match self {
            PipelineError::InvalidInput(msg) => json!({
                "error": "Invalid request",
                "details": msg,
            }),
            PipelineError::GenerationFailed(e) => json!({
                "error": "Failed to generate SQL query",
                "details": e.to_string(),
            }),
            PipelineError::ExecutionFailed { source, .. } => json!({
                "error": "Database query failed",
                "details": source.details(),
            }),
            PipelineError::ServerFault(_) => json!({
                "error": "Server error",
                "details": Value::Null,
            }),
        }
    }
}
