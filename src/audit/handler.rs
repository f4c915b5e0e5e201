//! HTTP handlers for the audit read API
//!
//! Provides 2 REST endpoints over the stored trail:
//! - GET /api/v1/audit                  recent entries (paginated)
//! - GET /api/v1/audit/:transactionId   one transaction's entries in stage order

use crate::audit::store::AuditQuery;
use crate::pipeline::types::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for audit handlers
#[derive(Clone)]
pub struct AuditState {
    pub query: Arc<dyn AuditQuery>,
}

/// Create the audit router with the read endpoints
pub fn audit_router(state: AuditState) -> Router {
    Router::new()
        .route("/api/v1/audit", get(list_recent))
        .route("/api/v1/audit/:transaction_id", get(get_transaction_trail))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ListAuditQuery {
    page: Option<u64>,
    #[serde(rename = "perPage")]
    per_page: Option<u64>,
}

/// GET /api/v1/audit
async fn list_recent(
    State(state): State<AuditState>,
    Query(params): Query<ListAuditQuery>,
) -> impl IntoResponse {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);

    let result = state.query.recent(page, per_page).await;
    Json(result)
}

/// GET /api/v1/audit/:transactionId
async fn get_transaction_trail(
    State(state): State<AuditState>,
    Path(transaction_id): Path<String>,
) -> impl IntoResponse {
    let entries = state.query.entries_for_transaction(&transaction_id).await;
    if entries.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(
                serde_json::to_value(ApiError::not_found(format!(
                    "Transaction {} not found",
                    transaction_id
                )))
                .unwrap(),
            ),
        );
    }

    (StatusCode::OK, Json(serde_json::to_value(entries).unwrap()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::store::{AuditSink, MemoryAuditSink};
    use crate::audit::types::AuditEntry;
    use crate::pipeline::types::Stage;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use tower::ServiceExt;

    async fn make_app() -> (Router, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        let state = AuditState {
            query: sink.clone(),
        };
        (audit_router(state), sink)
    }

    async fn seed(sink: &MemoryAuditSink, transaction_id: &str, stage: Stage, offset_ms: i64) {
        sink.append(AuditEntry {
            transaction_id: transaction_id.to_string(),
            caller_id: "test".to_string(),
            stage,
            input: json!({"prompt": "p"}),
            output: json!({"ok": true}),
            decision: "Logged".to_string(),
            timestamp: Utc::now() + Duration::milliseconds(offset_ms),
        })
        .await
        .unwrap();
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_list_recent_empty() {
        let (app, _sink) = make_app().await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/audit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 0);
        assert_eq!(json["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn test_get_transaction_trail_in_order() {
        let (app, sink) = make_app().await;
        seed(&sink, "tx-1", Stage::PromptReceived, 0).await;
        seed(&sink, "tx-1", Stage::Redaction, 10).await;
        seed(&sink, "tx-other", Stage::PromptReceived, 20).await;

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/audit/tx-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["stageName"], "promptReceived");
        assert_eq!(entries[1]["stageName"], "redaction");
        assert_eq!(entries[0]["transactionId"], "tx-1");
    }

    #[tokio::test]
    async fn test_get_transaction_trail_not_found() {
        let (app, _sink) = make_app().await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/audit/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_recent_pagination() {
        let (app, sink) = make_app().await;
        for i in 0..3 {
            seed(&sink, &format!("tx-{}", i), Stage::PromptReceived, i * 10).await;
        }

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/audit?page=1&perPage=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["pagination"]["total"], 3);
        assert_eq!(json["pagination"]["totalPages"], 2);
        // Newest first.
        assert_eq!(json["data"][0]["transactionId"], "tx-2");
    }
}
