//! AI-powered SQL generation from natural language
//!
//! A question is wrapped in a prompt that describes the tables, sent to a
//! generation provider, and the SQL that comes back is stripped of markdown
//! fences and executed as-is against MySQL.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlchat::ai_sql::{QueryPipeline, PromptGenerator, SchemaDescriptor, StatementGuard};
//!
//! let pipeline = QueryPipeline::new(
//!     provider,
//!     database,
//!     PromptGenerator::new(SchemaDescriptor::default()),
//!     StatementGuard::default(),
//! );
//! let rows = pipeline.handle_query(Some("top 10 products by revenue")).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod guard;
pub mod pipeline;
pub mod prompt;
pub mod schema;

pub use client::{AiProvider, AnthropicProvider, GeminiProvider, create_ai_client};
pub use config::{AiProviderType, AiSqlConfig};
pub use error::{AiError, AiResult, PipelineError, PipelineResult};
pub use extract::extract_sql;
pub use guard::{GuardMode, StatementGuard};
pub use pipeline::QueryPipeline;
pub use prompt::{PromptGenerator, build_prompt};
pub use schema::{SchemaDescriptor, TableDescriptor};
