use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::non_empty;
use crate::error::{ApiError, ApiResult};
use crate::middleware::SessionToken;
use crate::oauth::{flow, SessionInfo};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    /// Preferred Jira site (url, host or name) when the user can reach several.
    pub site: Option<String>,
    #[serde(default)]
    pub redirect: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /oauth/login - start the authorization-code flow
pub async fn login(State(state): State<AppState>, Query(params): Query<LoginParams>) -> ApiResult<Response> {
    if !state.oauth.is_enabled() {
        return Err(ApiError::service_unavailable("OAuth is not configured on this server"));
    }

    let site = non_empty(params.site.as_deref()).map(str::to_string);
    let oauth_state = state.states.issue(site).await;
    let authorization_url = state.oauth.authorization_url(&oauth_state)?;

    if params.redirect {
        return Ok(Redirect::to(&authorization_url).into_response());
    }

    Ok(Json(json!({
        "authorization_url": authorization_url,
        "state": oauth_state
    }))
    .into_response())
}

/// GET /oauth/callback - Atlassian redirects here with `code` and `state`
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Json<flow::CallbackOutcome>> {
    if let Some(error) = non_empty(params.error.as_deref()) {
        let detail = non_empty(params.error_description.as_deref()).unwrap_or(error);
        tracing::info!(error, "authorization denied or failed at Atlassian");
        return Err(ApiError::bad_request(format!("Authorization failed: {}", detail)));
    }

    let code = non_empty(params.code.as_deref())
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;
    let oauth_state = non_empty(params.state.as_deref())
        .ok_or_else(|| ApiError::bad_request("Missing OAuth state"))?;

    let outcome = flow::complete_callback(&state, code, oauth_state).await?;
    Ok(Json(outcome))
}

/// GET /oauth/session - describe the caller's session
pub async fn session_info(State(state): State<AppState>, SessionToken(token): SessionToken) -> ApiResult<Json<SessionInfo>> {
    let session = flow::resolve_session(&state, &token).await?;
    Ok(Json(session.info()))
}

/// DELETE /oauth/session - forget the caller's session
pub async fn logout(State(state): State<AppState>, SessionToken(token): SessionToken) -> ApiResult<Json<serde_json::Value>> {
    if !state.sessions.remove(&token).await {
        return Err(ApiError::not_found("Session not found"));
    }
    tracing::info!("OAuth session removed");
    Ok(Json(json!({ "message": "Logged out" })))
}
