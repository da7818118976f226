use serde::Serialize;

use super::client::{select_resource, OAuthError};
use super::session::{Session, SessionInfo};
use crate::error::{ApiError, ApiResult};
use crate::jira::{JiraClient, JiraTarget};
use crate::state::AppState;

/// What the callback hands back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackOutcome {
    pub session_token: String,
    #[serde(flatten)]
    pub session: SessionInfo,
}

/// Finish the authorization-code flow: validate state, exchange the code,
/// pick the Jira site and cache the resulting session.
#[tracing::instrument(skip_all)]
pub async fn complete_callback(state: &AppState, code: &str, oauth_state: &str) -> ApiResult<CallbackOutcome> {
    let pending = state
        .states
        .consume(oauth_state)
        .await
        .ok_or_else(|| ApiError::bad_request("Invalid or expired OAuth state"))?;

    let token = state.oauth.exchange_code(code).await?;
    let resources = state.oauth.accessible_resources(&token.access_token).await?;
    if resources.is_empty() {
        return Err(ApiError::forbidden("No accessible Jira sites for this account"));
    }

    let resource = select_resource(&resources, pending.site.as_deref()).ok_or_else(|| {
        ApiError::forbidden(format!(
            "Jira site '{}' is not accessible with this authorization",
            pending.site.as_deref().unwrap_or_default()
        ))
    })?;

    let mut session = Session::from_token(&token, resource, state.config.session.default_ttl_secs);

    let client = JiraClient::new(
        state.http.clone(),
        JiraTarget::for_cloud(state.oauth.api_base_url(), &session.cloud_id, &session.access_token),
    );
    match client.myself().await {
        Ok(user) if !user.account_id.is_empty() => session.account_id = Some(user.account_id),
        Ok(_) => {}
        Err(e) => tracing::warn!("could not resolve Jira account for new session: {}", e),
    }

    let info = session.info();
    let session_token = state.sessions.insert(session).await;
    tracing::info!(cloud_id = %info.cloud_id, site = %info.site_url, "OAuth session established");

    Ok(CallbackOutcome {
        session_token,
        session: info,
    })
}

/// Look up a session, refreshing it when it has expired and can be refreshed.
pub async fn resolve_session(state: &AppState, token: &str) -> ApiResult<Session> {
    let session = state
        .sessions
        .get(token)
        .await
        .ok_or_else(|| ApiError::unauthorized("Unknown or expired session; authenticate via /oauth/login"))?;

    if !session.is_expired() {
        return Ok(session);
    }

    let _guard = state.sessions.lock_refresh(token).await;

    // Another request may have refreshed while we waited.
    let session = state
        .sessions
        .get(token)
        .await
        .ok_or_else(|| ApiError::unauthorized("Unknown or expired session; authenticate via /oauth/login"))?;
    if !session.is_expired() {
        return Ok(session);
    }

    let Some(refresh_token) = session.refresh_token.clone() else {
        state.sessions.remove(token).await;
        return Err(ApiError::unauthorized("Session expired; authenticate via /oauth/login"));
    };

    match state.oauth.refresh(&refresh_token).await {
        Ok(response) => {
            let mut session = session;
            session.apply_refresh(&response, state.config.session.default_ttl_secs);
            state.sessions.replace(token, session.clone()).await;
            tracing::debug!(cloud_id = %session.cloud_id, "refreshed OAuth session");
            Ok(session)
        }
        Err(OAuthError::Status { status, .. }) => {
            tracing::info!(status, "refresh token rejected; dropping session");
            state.sessions.remove(token).await;
            Err(ApiError::unauthorized("Session refresh rejected; authenticate via /oauth/login"))
        }
        Err(e) => Err(e.into()),
    }
}
