//! HTTP handler for the governance pipeline
//!
//! Provides the single write endpoint:
//! - POST /api/v1/process   run one prompt through the pipeline
//!
//! Input rejections map to 400 with the standard error envelope; an
//! aborted transaction maps to 500 and carries its partial trace so the
//! caller can see how far it got.

use crate::error::Error;
use crate::pipeline::supervisor::Supervisor;
use crate::pipeline::types::{ApiError, ProcessRequest};
use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use std::sync::Arc;

/// Shared state for pipeline handlers
#[derive(Clone)]
pub struct PipelineState {
    pub supervisor: Arc<Supervisor>,
}

/// Create the pipeline router with the process endpoint
pub fn pipeline_router(state: PipelineState) -> Router {
    Router::new()
        .route("/api/v1/process", post(process_prompt))
        .with_state(state)
}

/// POST /api/v1/process
async fn process_prompt(
    State(state): State<PipelineState>,
    Json(request): Json<ProcessRequest>,
) -> impl IntoResponse {
    match state.supervisor.process(request).await {
        Ok(transaction) => (
            StatusCode::OK,
            Json(serde_json::to_value(transaction).unwrap()),
        ),
        Err(Error::Input(message)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::to_value(ApiError::bad_request(message)).unwrap()),
        ),
        Err(Error::Transaction { message, trace }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": { "code": "TRANSACTION_ERROR", "message": message },
                "trace": trace,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::to_value(ApiError::internal(e.to_string())).unwrap()),
        ),
    }
}
