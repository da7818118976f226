use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service description
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "jira-bridge",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Jira Cloud proxy for assistant clients",
        "environment": state.config.environment,
        "endpoints": {
            "projects": "GET /projects",
            "tickets": "POST /ticket, GET|PATCH /ticket/:key",
            "comments": "GET|POST /ticket/:key/comments, PATCH /ticket/:key/comments/:id",
            "attachments": "POST /ticket/:key/attachments",
            "impact": "GET /impact/{label|component|module|ticket}/:value",
            "export": "GET /export/impact/{label|component|module|ticket}/:value?format=csv|docx",
            "oauth": "GET /oauth/login, GET /oauth/callback, GET|DELETE /oauth/session",
        }
    }))
}

/// GET /health - liveness plus credential availability
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "oauth_enabled": state.oauth.is_enabled(),
        "static_credentials": state.config.jira.static_target().is_some(),
        "sessions": state.sessions.len().await,
    }))
}
