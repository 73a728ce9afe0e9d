//! Database abstraction used by the query pipeline and the history handlers
//!
//! The pipeline only needs "run this SQL text and give me rows back", and the
//! history endpoints need a parameterised insert and an ordered read. Both are
//! expressed by [`DatabaseClient`] so handlers can be exercised against fakes.
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// One result row: column name to JSON value, in column order
/// (`serde_json` is built with `preserve_order`)
pub type Row = Map<String, Value>;

/// A stored question/answer pair from the `customer_queries` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub query_text: String,
    pub query_date: NaiveDateTime,
    pub response_text: String,
}

/// Errors reported by a database collaborator
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Driver error detail suitable for a JSON error body
    pub fn details(&self) -> Value {
        match self {
            DatabaseError::SqlxError(sqlx::Error::Database(db_err)) => json!({
                "code": db_err.code().map(|c| c.into_owned()),
                "message": db_err.message(),
            }),
            DatabaseError::SqlxError(e) => json!({ "code": null, "message": e.to_string() }),
            DatabaseError::ConnectionError(msg) => {
                json!({ "code": "CONNECTION", "message": msg })
            }
            DatabaseError::QueryError(msg) => json!({ "code": "QUERY", "message": msg }),
        }
    }
}

#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Execute a literal SQL string and return every row it produced
    async fn execute_query(&self, sql: &str) -> Result<Vec<Row>, DatabaseError>;

    /// Persist one history entry, timestamped by the database
    async fn insert_history(
        &self,
        query_text: &str,
        response_text: &str,
    ) -> Result<(), DatabaseError>;

    /// Read the stored history, newest first
    async fn fetch_history(&self) -> Result<Vec<HistoryRecord>, DatabaseError>;

    /// Check if the connection is still usable
    async fn is_connected(&self) -> bool;

    /// Close the underlying connections
    async fn close(&self);
}
