//! HTTP surface
//!
//! `POST /fetch-query`, `POST /store-history`, `GET /fetch-history` and a
//! `GET /health` probe, all speaking JSON.

use crate::ai_sql::{PipelineError, QueryPipeline};
use crate::database::DatabaseClient;
use crate::history::{self, HistoryError, StoreHistoryRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Collaborators shared by every request
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QueryPipeline>,
    pub database: Arc<dyn DatabaseClient>,
}

impl AppState {
    pub fn new(pipeline: Arc<QueryPipeline>, database: Arc<dyn DatabaseClient>) -> Self {
        Self { pipeline, database }
    }
}

/// Build the application router
pub fn router(state: AppState, cors_permissive: bool) -> Router {
    let app = Router::new()
        .route("/fetch-query", post(fetch_query))
        .route("/store-history", post(store_history))
        .route("/fetch-history", get(fetch_history))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        (status(self.status_code()), Json(self.to_body())).into_response()
    }
}

impl IntoResponse for HistoryError {
    fn into_response(self) -> Response {
        let message = match &self {
            HistoryError::MissingFields => self.to_string(),
            HistoryError::Database(_) => "Database error".to_string(),
        };
        (status(self.status_code()), Json(json!({ "message": message }))).into_response()
    }
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    error!("Handler panicked: {}", detail);
    PipelineError::ServerFault(detail).into_response()
}

async fn fetch_query(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, PipelineError> {
    let Json(body) = body.map_err(|rejection| {
        warn!("Rejected /fetch-query body: {}", rejection);
        PipelineError::InvalidInput(rejection.body_text())
    })?;

    let rows = state
        .pipeline
        .handle_query(body.get("query").and_then(Value::as_str))
        .await?;

    Ok(Json(json!({ "result": rows })))
}

async fn store_history(
    State(state): State<AppState>,
    body: Result<Json<StoreHistoryRequest>, JsonRejection>,
) -> Result<Json<Value>, HistoryError> {
    let Json(request) = body.map_err(|rejection| {
        warn!("Rejected /store-history body: {}", rejection);
        HistoryError::MissingFields
    })?;

    history::store_history(state.database.as_ref(), &request).await?;
    Ok(Json(json!({ "message": "History stored successfully" })))
}

async fn fetch_history(State(state): State<AppState>) -> Result<Json<Value>, HistoryError> {
    let records = history::fetch_history(state.database.as_ref()).await?;
    Ok(Json(json!({ "history": records })))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.database.is_connected().await {
        (
            StatusCode::OK,
            Json(json!({ "status": "ok", "provider": state.pipeline.provider_name() })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}
