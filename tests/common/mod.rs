//! In-memory collaborators for driving the router without MySQL or a model API

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDateTime;
use serde_json::Value;
use sqlchat::ai_sql::{
    AiError, AiProvider, AiResult, PromptGenerator, QueryPipeline, SchemaDescriptor,
    StatementGuard,
};
use sqlchat::database::{DatabaseClient, DatabaseError, HistoryRecord, Row};
use sqlchat::server::{AppState, router};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub enum Reply {
    Text(String),
    Fail(String),
    Panic,
}

pub struct FakeProvider {
    reply: Reply,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn text(text: &str) -> Arc<Self> {
        Self::new(Reply::Text(text.to_string()))
    }
}

#[async_trait]
impl AiProvider for FakeProvider {
    async fn generate(&self, prompt: &str) -> AiResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(AiError::NetworkError(message.clone())),
            Reply::Panic => panic!("provider exploded"),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Default)]
pub struct FakeDatabase {
    pub rows: Vec<Row>,
    pub fail: bool,
    pub executed: Mutex<Vec<String>>,
    pub history: Mutex<Vec<HistoryRecord>>,
}

impl FakeDatabase {
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatabaseClient for FakeDatabase {
    async fn execute_query(&self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
        self.executed.lock().unwrap().push(sql.to_string());
        if self.fail {
            return Err(DatabaseError::QueryError(format!(
                "You have an error in your SQL syntax near '{sql}'"
            )));
        }
        Ok(self.rows.clone())
    }

    async fn insert_history(
        &self,
        query_text: &str,
        response_text: &str,
    ) -> Result<(), DatabaseError> {
        if self.fail {
            return Err(DatabaseError::ConnectionError("connection lost".to_string()));
        }
        self.history.lock().unwrap().push(HistoryRecord {
            query_text: query_text.to_string(),
            query_date: timestamp("2024-06-01 12:00:00"),
            response_text: response_text.to_string(),
        });
        Ok(())
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryRecord>, DatabaseError> {
        if self.fail {
            return Err(DatabaseError::ConnectionError("connection lost".to_string()));
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn is_connected(&self) -> bool {
        !self.fail
    }

    async fn close(&self) {}
}

pub fn timestamp(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn app(provider: Arc<FakeProvider>, database: Arc<FakeDatabase>) -> Router {
    let pipeline = Arc::new(QueryPipeline::new(
        provider,
        database.clone(),
        PromptGenerator::new(SchemaDescriptor::default()),
        StatementGuard::default(),
    ));
    router(AppState::new(pipeline, database), true)
}

pub async fn send_text(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, text) = send_text(app, request).await;
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
