//! HTTP request handlers

use super::AppState;
use crate::response::Reply;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Skill webhook
        .route("/api/alexa", post(handle_skill_request))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Skill Webhook
// ============================================================

async fn handle_skill_request(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Reply {
    match payload {
        Ok(Json(payload)) => state.dispatcher.handle_payload(&payload).await,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejecting unreadable skill request");
            Reply::bad_request()
        }
    }
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("skill_gateway ", env!("CARGO_PKG_VERSION"))
}
