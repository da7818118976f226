// handlers/mod.rs - route handlers grouped by area
//
// Every handler that talks to Jira takes a `ResolvedJira` extractor, which
// picks the caller's OAuth session or the static basic-auth account.

pub mod attachments;
pub mod comments;
pub mod impact;
pub mod oauth;
pub mod projects;
pub mod system;
pub mod tickets;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Reject keys that could not be a Jira issue key or id, before they reach a URL path.
pub(crate) fn validate_issue_key(key: &str) -> ApiResult<()> {
    let valid = !key.is_empty()
        && key.len() <= 64
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("Invalid issue key '{}'", key)))
    }
}

pub(crate) fn validate_comment_id(id: &str) -> ApiResult<()> {
    if !id.is_empty() && id.len() <= 32 && id.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("Invalid comment id '{}'", id)))
    }
}

/// Project for a request: explicit override first, then `JIRA_PROJECT`.
pub(crate) fn resolve_project(state: &AppState, requested: Option<&str>) -> ApiResult<String> {
    requested
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .or_else(|| state.config.jira.project_key.clone())
        .ok_or_else(|| ApiError::bad_request("Missing project key; set JIRA_PROJECT or pass a project"))
}

/// Trimmed, non-empty text field.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
