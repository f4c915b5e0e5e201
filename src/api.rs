//! Unified API router for PromptGate
//!
//! Merges the module routers into a single axum `Router` with CORS and a
//! root health endpoint.
//!
//! ## Endpoint Map
//!
//! | Prefix                    | Module   | Description                        |
//! |---------------------------|----------|------------------------------------|
//! | `/health`                 | api      | Load balancer health check         |
//! | `/api/v1/process`         | pipeline | Run one prompt through the pipeline|
//! | `/api/v1/audit/*`         | audit    | Stored audit trails                |

use crate::audit::{audit_router, AuditState};
use crate::pipeline::{pipeline_router, PipelineState};
use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

/// Build the complete PromptGate HTTP application
///
/// Merges the module routers, adds CORS middleware, and returns a single
/// `Router` ready to be served by `axum::serve`.
pub fn build_app(
    pipeline_state: PipelineState,
    audit_state: AuditState,
    cors_origins: &[String],
) -> Router {
    let cors = build_cors(cors_origins);

    Router::new()
        // Root-level health check
        .route("/health", get(health_check))
        // Module routers (each defines its own /api/... prefixed routes)
        .merge(pipeline_router(pipeline_state))
        .merge(audit_router(audit_state))
        // CORS
        .layer(cors)
}

// =============================================================================
// Root handlers
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}
