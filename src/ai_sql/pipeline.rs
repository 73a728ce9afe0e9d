//! Natural-language question to result rows
//!
//! One request runs strictly in order: build prompt, generate, extract,
//! execute. Nothing is retried and nothing is shared between requests apart
//! from the injected collaborators.

use crate::ai_sql::client::AiProvider;
use crate::ai_sql::error::{PipelineError, PipelineResult};
use crate::ai_sql::extract::extract_sql;
use crate::ai_sql::guard::StatementGuard;
use crate::ai_sql::prompt::PromptGenerator;
use crate::database::{DatabaseClient, DatabaseError, Row};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct QueryPipeline {
    provider: Arc<dyn AiProvider>,
    database: Arc<dyn DatabaseClient>,
    prompts: PromptGenerator,
    guard: StatementGuard,
}

impl QueryPipeline {
    pub fn new(
        provider: Arc<dyn AiProvider>,
        database: Arc<dyn DatabaseClient>,
        prompts: PromptGenerator,
        guard: StatementGuard,
    ) -> Self {
        Self {
            provider,
            database,
            prompts,
            guard,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Answer `user_query` with the rows of the generated statement
    pub async fn handle_query(&self, user_query: Option<&str>) -> PipelineResult<Vec<Row>> {
        let result = self.run(user_query).await;
        if let Err(e) = &result {
            error!("Query pipeline failed at {} stage: {}", e.stage(), e);
        }
        result
    }

    async fn run(&self, user_query: Option<&str>) -> PipelineResult<Vec<Row>> {
        let user_query = user_query.ok_or_else(|| {
            PipelineError::InvalidInput("query is required and must be a string".to_string())
        })?;

        let prompt = self.prompts.build_prompt(user_query);
        debug!("Prompt length: {} chars", prompt.len());

        let raw = self
            .provider
            .generate(&prompt)
            .await
            .map_err(PipelineError::GenerationFailed)?;

        let sql = extract_sql(&raw);
        info!("Generated SQL Query: {}", sql);

        self.guard
            .check(&sql)
            .map_err(|reason| PipelineError::ExecutionFailed {
                sql: sql.clone(),
                source: DatabaseError::QueryError(reason),
            })?;

        let rows = self
            .database
            .execute_query(&sql)
            .await
            .map_err(|source| PipelineError::ExecutionFailed {
                sql: sql.clone(),
                source,
            })?;

        info!("Database query returned {} rows", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_sql::error::{AiError, AiResult};
    use crate::ai_sql::guard::GuardMode;
    use crate::ai_sql::schema::SchemaDescriptor;
    use crate::database::HistoryRecord;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedProvider {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AiProvider for ScriptedProvider {
        async fn generate(&self, prompt: &str) -> AiResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|msg| AiError::ApiError { status_code: 429, message: msg })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct RecordingDatabase {
        rows: Vec<Row>,
        fail_with: Option<String>,
        executed: Mutex<Vec<String>>,
    }

    impl RecordingDatabase {
        fn returning(rows: Vec<Row>) -> Arc<Self> {
            Arc::new(Self {
                rows,
                fail_with: None,
                executed: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                rows: Vec::new(),
                fail_with: Some(message.to_string()),
                executed: Mutex::new(Vec::new()),
            })
        }

        fn executed(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DatabaseClient for RecordingDatabase {
        async fn execute_query(&self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
            self.executed.lock().unwrap().push(sql.to_string());
            match &self.fail_with {
                Some(msg) => Err(DatabaseError::QueryError(msg.clone())),
                None => Ok(self.rows.clone()),
            }
        }

        async fn insert_history(&self, _: &str, _: &str) -> Result<(), DatabaseError> {
            Ok(())
        }

        async fn fetch_history(&self) -> Result<Vec<HistoryRecord>, DatabaseError> {
            Ok(Vec::new())
        }

        async fn is_connected(&self) -> bool {
            true
        }

        async fn close(&self) {}
    }

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn pipeline(
        provider: Arc<ScriptedProvider>,
        database: Arc<RecordingDatabase>,
        mode: GuardMode,
    ) -> QueryPipeline {
        QueryPipeline::new(
            provider,
            database,
            PromptGenerator::new(SchemaDescriptor::default()),
            StatementGuard::new(mode),
        )
    }

    #[tokio::test]
    async fn test_fenced_sql_is_executed_verbatim() {
        let provider = ScriptedProvider::replying(
            "```sql\nSELECT COUNT(*) FROM sales_data WHERE sale_date = CURDATE()\n```",
        );
        let database = RecordingDatabase::returning(vec![row(json!({ "COUNT(*)": 5 }))]);
        let pipeline = pipeline(provider.clone(), database.clone(), GuardMode::Permissive);

        let rows = pipeline
            .handle_query(Some("how many sales today"))
            .await
            .unwrap();

        assert_eq!(rows, vec![row(json!({ "COUNT(*)": 5 }))]);
        assert_eq!(
            database.executed(),
            vec!["SELECT COUNT(*) FROM sales_data WHERE sale_date = CURDATE()".to_string()]
        );
        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("how many sales today"));
        assert!(prompts[0].contains("sales_data"));
    }

    #[tokio::test]
    async fn test_missing_query_is_invalid_input() {
        let provider = ScriptedProvider::replying("SELECT 1");
        let database = RecordingDatabase::returning(vec![]);
        let pipeline = pipeline(provider.clone(), database.clone(), GuardMode::Permissive);

        let err = pipeline.handle_query(None).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(provider.prompts.lock().unwrap().is_empty());
        assert!(database.executed().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_skips_database() {
        let database = RecordingDatabase::returning(vec![]);
        let pipeline = pipeline(
            ScriptedProvider::failing("quota exceeded"),
            database.clone(),
            GuardMode::Permissive,
        );

        let err = pipeline.handle_query(Some("top products")).await.unwrap_err();

        match err {
            PipelineError::GenerationFailed(AiError::ApiError { status_code, message }) => {
                assert_eq!(status_code, 429);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(database.executed().is_empty());
    }

    #[tokio::test]
    async fn test_database_failure_is_execution_failed() {
        let database = RecordingDatabase::failing("You have an error in your SQL syntax");
        let pipeline = pipeline(
            ScriptedProvider::replying("not even sql"),
            database.clone(),
            GuardMode::Permissive,
        );

        let err = pipeline.handle_query(Some("anything")).await.unwrap_err();

        match err {
            PipelineError::ExecutionFailed { sql, source } => {
                assert_eq!(sql, "not even sql");
                assert!(source.to_string().contains("SQL syntax"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(database.executed(), vec!["not even sql".to_string()]);
    }

    #[tokio::test]
    async fn test_permissive_mode_runs_destructive_sql() {
        let database = RecordingDatabase::returning(vec![]);
        let pipeline = pipeline(
            ScriptedProvider::replying("```sql\nDROP TABLE products\n```"),
            database.clone(),
            GuardMode::Permissive,
        );

        let rows = pipeline.handle_query(Some("remove products")).await.unwrap();

        assert!(rows.is_empty());
        assert_eq!(database.executed(), vec!["DROP TABLE products".to_string()]);
    }

    #[tokio::test]
    async fn test_read_only_mode_blocks_destructive_sql() {
        let database = RecordingDatabase::returning(vec![]);
        let pipeline = pipeline(
            ScriptedProvider::replying("DROP TABLE products"),
            database.clone(),
            GuardMode::ReadOnly,
        );

        let err = pipeline.handle_query(Some("remove products")).await.unwrap_err();

        assert!(matches!(err, PipelineError::ExecutionFailed { .. }));
        assert_eq!(err.status_code(), 500);
        assert!(database.executed().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_string_is_passed_through() {
        let provider = ScriptedProvider::replying("SELECT 1");
        let database = RecordingDatabase::returning(vec![row(json!({ "1": 1 }))]);
        let pipeline = pipeline(provider.clone(), database, GuardMode::Permissive);

        let rows = pipeline.handle_query(Some("")).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert!(provider.prompts.lock().unwrap()[0].contains("query: ''"));
    }
}
