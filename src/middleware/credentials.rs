use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use crate::jira::{JiraClient, JiraTarget};
use crate::oauth::{flow, Session};
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-token";
pub const SESSION_QUERY_PARAM: &str = "session";

/// Jira client resolved for the current caller.
///
/// A presented session token always wins; static basic-auth credentials are
/// only used when the request carries no token at all.
#[derive(Debug, Clone)]
pub struct ResolvedJira {
    pub client: JiraClient,
    pub session: Option<Session>,
}

#[async_trait]
impl FromRequestParts<AppState> for ResolvedJira {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(token) = session_token_from_parts(parts) {
            let session = flow::resolve_session(state, &token).await?;
            let target = JiraTarget::for_cloud(state.oauth.api_base_url(), &session.cloud_id, &session.access_token);
            return Ok(Self {
                client: JiraClient::new(state.http.clone(), target),
                session: Some(session),
            });
        }

        if let Some(target) = state.config.jira.static_target() {
            return Ok(Self {
                client: JiraClient::new(state.http.clone(), target),
                session: None,
            });
        }

        Err(ApiError::unauthorized(
            "Jira credentials not configured; authenticate via /oauth/login",
        ))
    }
}

/// The raw session token of the caller; 401 when absent.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_token_from_parts(parts)
            .map(SessionToken)
            .ok_or_else(|| ApiError::unauthorized("Missing session token"))
    }
}

/// Extract a session token from `Authorization: Bearer`, `X-Session-Token`
/// or the `session` query parameter, in that order.
pub fn session_token_from_parts(parts: &Parts) -> Option<String> {
    let from_bearer = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = from_bearer {
        return Some(token.to_string());
    }

    let from_header = parts
        .headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    parts.uri.query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, v)| k == SESSION_QUERY_PARAM && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_header_takes_precedence() {
        let p = parts(
            Request::builder()
                .uri("/projects?session=from-query")
                .header("authorization", "Bearer from-bearer")
                .header(SESSION_HEADER, "from-header"),
        );
        assert_eq!(session_token_from_parts(&p).as_deref(), Some("from-bearer"));
    }

    #[test]
    fn falls_back_to_header_then_query() {
        let p = parts(Request::builder().uri("/projects?session=q").header(SESSION_HEADER, "h"));
        assert_eq!(session_token_from_parts(&p).as_deref(), Some("h"));

        let p = parts(Request::builder().uri("/projects?max_results=5&session=q%20"));
        assert_eq!(session_token_from_parts(&p).as_deref(), Some("q"));
    }

    #[test]
    fn basic_auth_header_is_not_a_session() {
        let p = parts(Request::builder().uri("/projects").header("authorization", "Basic Zm9vOmJhcg=="));
        assert!(session_token_from_parts(&p).is_none());

        let p = parts(Request::builder().uri("/projects").header("authorization", "Bearer   "));
        assert!(session_token_from_parts(&p).is_none());
    }
}
