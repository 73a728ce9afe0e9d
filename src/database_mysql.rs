//! MySQL implementation of the database collaborator
use crate::config::DatabaseConfig;
use crate::database::{DatabaseClient, DatabaseError, HistoryRecord, Row};
use crate::password_sanitizer::sanitize_connection_url;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::types::{Decimal, JsonValue};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::{debug, info};

const INSERT_HISTORY_SQL: &str = "INSERT INTO customer_queries (query_text, query_date, response_text) VALUES (?, NOW(), ?)";

const FETCH_HISTORY_SQL: &str =
    "SELECT query_text, query_date, response_text FROM customer_queries ORDER BY query_date DESC";

/// MySQL database client backed by a shared connection pool
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let database_url = config.connection_url();
        info!(
            "Connecting to MySQL at {}",
            sanitize_connection_url(&database_url)
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(600))
            .connect(&database_url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn execute_query(&self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
        debug!("[MySqlClient::execute_query] Executing query");

        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut record = Row::new();
            for i in 0..row.len() {
                let name = row.column(i).name().to_string();
                record.insert(name, mysql_value_to_json(row, i)?);
            }
            results.push(record);
        }

        debug!(
            "[MySqlClient::execute_query] Query completed with {} rows",
            results.len()
        );
        Ok(results)
    }

    async fn insert_history(
        &self,
        query_text: &str,
        response_text: &str,
    ) -> Result<(), DatabaseError> {
        debug!("[MySqlClient::insert_history] Storing history entry");

        sqlx::query(INSERT_HISTORY_SQL)
            .bind(query_text)
            .bind(response_text)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryRecord>, DatabaseError> {
        debug!("[MySqlClient::fetch_history] Loading history");

        let rows = sqlx::query(FETCH_HISTORY_SQL).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<HistoryRecord, DatabaseError> {
                Ok(HistoryRecord {
                    query_text: row.try_get("query_text")?,
                    query_date: history_timestamp(row)?,
                    response_text: row.try_get("response_text")?,
                })
            })
            .collect()
    }

    async fn is_connected(&self) -> bool {
        (sqlx::query("SELECT 1").fetch_one(&self.pool).await).is_ok()
    }

    async fn close(&self) {
        debug!("[MySqlClient::close] Closing MySQL connection pool");
        self.pool.close().await;
    }
}

/// `query_date` as a timestamp. A DATE column reads as midnight of that day.
fn history_timestamp(row: &MySqlRow) -> Result<NaiveDateTime, DatabaseError> {
    match row.try_get::<NaiveDateTime, _>("query_date") {
        Ok(timestamp) => Ok(timestamp),
        Err(datetime_err) => row
            .try_get::<NaiveDate, _>("query_date")
            .map(start_of_day)
            .map_err(|_| DatabaseError::from(datetime_err)),
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Convert one MySQL column value to JSON
fn mysql_value_to_json(row: &MySqlRow, column_index: usize) -> Result<Value, DatabaseError> {
    let column = row.column(column_index);
    let type_info = column.type_info();

    if let Ok(value_ref) = row.try_get_raw(column_index) {
        if value_ref.is_null() {
            return Ok(Value::Null);
        }
    }

    if type_info.name() == "JSON" {
        if let Ok(val) = row.try_get::<JsonValue, _>(column_index) {
            return Ok(val);
        }
    }

    if let Ok(val) = row.try_get::<i64, _>(column_index) {
        return Ok(Value::from(val));
    }

    if let Ok(val) = row.try_get::<u64, _>(column_index) {
        return Ok(Value::from(val));
    }

    if let Ok(val) = row.try_get::<f64, _>(column_index) {
        return Ok(Number::from_f64(val).map(Value::Number).unwrap_or(Value::Null));
    }

    if let Ok(val) = row.try_get::<f32, _>(column_index) {
        return Ok(Number::from_f64(f64::from(val))
            .map(Value::Number)
            .unwrap_or(Value::Null));
    }

    // DECIMAL keeps its exact textual form
    if let Ok(val) = row.try_get::<Decimal, _>(column_index) {
        return Ok(Value::String(val.to_string()));
    }

    if let Ok(val) = row.try_get::<String, _>(column_index) {
        return Ok(Value::String(val));
    }

    if let Ok(val) = row.try_get::<bool, _>(column_index) {
        return Ok(Value::Bool(val));
    }

    if let Ok(val) = row.try_get::<chrono::NaiveDateTime, _>(column_index) {
        return Ok(Value::String(val.format("%Y-%m-%dT%H:%M:%S").to_string()));
    }

    if let Ok(val) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(column_index) {
        return Ok(Value::String(val.to_rfc3339()));
    }

    if let Ok(val) = row.try_get::<chrono::NaiveDate, _>(column_index) {
        return Ok(Value::String(val.format("%Y-%m-%d").to_string()));
    }

    if let Ok(val) = row.try_get::<chrono::NaiveTime, _>(column_index) {
        return Ok(Value::String(val.format("%H:%M:%S").to_string()));
    }

    if let Ok(bytes) = row.try_get::<Vec<u8>, _>(column_index) {
        return Ok(match String::from_utf8(bytes) {
            Ok(text) => Value::String(text),
            Err(e) => Value::String(format!("\\x{}", hex::encode(e.into_bytes()))),
        });
    }

    Err(DatabaseError::QueryError(format!(
        "Unable to convert MySQL {} value at column {column_index}",
        type_info.name()
    )))
}
