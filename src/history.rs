//! Store and read back the conversation history
use crate::database::{DatabaseClient, DatabaseError, HistoryRecord};
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

/// Body of `POST /store-history`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHistoryRequest {
    #[serde(default)]
    pub user_input: Option<String>,
    #[serde(default)]
    pub bot_response: Option<String>,
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("userInput and botResponse are required")]
    MissingFields,

    #[error("Database error")]
    Database(#[from] DatabaseError),
}

impl HistoryError {
    pub fn status_code(&self) -> u16 {
        match self {
            HistoryError::MissingFields => 400,
            HistoryError::Database(_) => 500,
        }
    }
}

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Persist one question/answer pair. Nothing is written unless both are present.
pub async fn store_history(
    database: &dyn DatabaseClient,
    request: &StoreHistoryRequest,
) -> Result<(), HistoryError> {
    let (Some(user_input), Some(bot_response)) =
        (required(&request.user_input), required(&request.bot_response))
    else {
        return Err(HistoryError::MissingFields);
    };

    database
        .insert_history(user_input, bot_response)
        .await
        .map_err(|e| {
            error!("Error storing history in the database: {}", e);
            HistoryError::from(e)
        })
}

/// All stored history, newest first
pub async fn fetch_history(database: &dyn DatabaseClient) -> Result<Vec<HistoryRecord>, HistoryError> {
    let mut records = database.fetch_history().await.map_err(|e| {
        error!("Error fetching chat history: {}", e);
        HistoryError::from(e)
    })?;

    records.sort_by(|a, b| b.query_date.cmp(&a.query_date));
    Ok(records)
}
