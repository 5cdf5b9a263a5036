//! HTTP handlers for the request/response endpoints.

use crate::metrics::HostInfo;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

/// `GET /info`: host information, recomputed on every request.
pub async fn host_info(State(state): State<AppState>) -> Response {
    let provider = state.provider.clone();

    match tokio::task::spawn_blocking(move || provider.host_info()).await {
        Ok(Ok(info)) => Json::<HostInfo>(info).into_response(),
        Ok(Err(e)) => {
            error!("Failed to get system info: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
        Err(e) => {
            error!("System info task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "statcast",
        "version": env!("CARGO_PKG_VERSION"),
        "subscribers": state.registry.count().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
