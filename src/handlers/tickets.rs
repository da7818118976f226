use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{non_empty, resolve_project, validate_issue_key};
use crate::error::{ApiError, ApiResult};
use crate::jira::models::IssueUpdate;
use crate::middleware::ResolvedJira;
use crate::state::AppState;

pub const VALID_ISSUE_TYPES: [&str; 4] = ["Bug", "Task", "Story", "Improvement"];
pub const DEFAULT_ISSUE_TYPE: &str = "Bug";

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub issue_type: Option<String>,
    pub project_key: Option<String>,
}

/// POST /ticket - create an issue in the configured (or requested) project
pub async fn create(
    State(state): State<AppState>,
    jira: ResolvedJira,
    Json(body): Json<CreateTicketRequest>,
) -> ApiResult<Json<Value>> {
    let summary = non_empty(body.summary.as_deref());
    let description = non_empty(body.description.as_deref());
    let project = resolve_project(&state, body.project_key.as_deref()).ok();

    let (Some(summary), Some(description), Some(project)) = (summary, description, project) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let issue_type = body.issue_type.as_deref().unwrap_or(DEFAULT_ISSUE_TYPE);
    if !VALID_ISSUE_TYPES.contains(&issue_type) {
        return Err(ApiError::bad_request(format!(
            "Invalid issue type. Must be one of: {}",
            VALID_ISSUE_TYPES.join(", ")
        )));
    }

    let key = jira
        .client
        .create_issue(&project, summary, description, issue_type)
        .await?;

    Ok(Json(json!({
        "message": "Jira issue created successfully.",
        "issueKey": key
    })))
}

/// GET /ticket/:key - summary, plain-text description and status
pub async fn get(jira: ResolvedJira, Path(key): Path<String>) -> ApiResult<Json<Value>> {
    validate_issue_key(&key)?;
    let issue = jira.client.get_issue(&key).await?;

    Ok(Json(json!({
        "key": &issue.key,
        "summary": &issue.fields.summary,
        "description": issue.description_text(),
        "description_adf": &issue.fields.description,
        "status": issue.status_name(),
        "issue_type": issue.issue_type_name(),
        "labels": &issue.fields.labels,
        "components": issue.component_names(),
    })))
}

/// PATCH /ticket/:key - update summary and/or description
pub async fn update(
    jira: ResolvedJira,
    Path(key): Path<String>,
    Json(body): Json<IssueUpdate>,
) -> ApiResult<Json<Value>> {
    validate_issue_key(&key)?;
    if body.is_empty() {
        return Err(ApiError::bad_request("Nothing to update; provide summary or description"));
    }

    jira.client.update_issue(&key, &body).await?;

    Ok(Json(json!({
        "message": format!("Ticket {} updated successfully", key)
    })))
}
