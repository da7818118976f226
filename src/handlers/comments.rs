use axum::{extract::Path, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{non_empty, validate_comment_id, validate_issue_key};
use crate::error::{ApiError, ApiResult};
use crate::jira::models::{Comment, JiraUser};
use crate::jira::adf;
use crate::middleware::ResolvedJira;

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created: String,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.clone(),
            author: comment.author.display_name.clone(),
            body: adf::to_plain_text(&comment.body),
            created: comment.created.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub body: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// GET /ticket/:key/comments
pub async fn list(jira: ResolvedJira, Path(key): Path<String>) -> ApiResult<Json<Vec<CommentView>>> {
    validate_issue_key(&key)?;
    let comments = jira.client.list_comments(&key).await?;
    Ok(Json(comments.iter().map(CommentView::from).collect()))
}

/// POST /ticket/:key/comments
pub async fn add(
    jira: ResolvedJira,
    Path(key): Path<String>,
    Json(body): Json<AddCommentRequest>,
) -> ApiResult<Json<Value>> {
    validate_issue_key(&key)?;
    let text = non_empty(body.body.as_deref()).ok_or_else(|| ApiError::bad_request("Missing comment body"))?;

    let created = jira.client.add_comment(&key, text).await?;

    Ok(Json(json!({
        "message": "Comment added successfully.",
        "id": created.id
    })))
}

/// Whether `caller` wrote the comment: account ids when both sides have one,
/// email addresses otherwise.
pub fn is_comment_author(caller: &JiraUser, author: &JiraUser) -> bool {
    if !caller.account_id.is_empty() && !author.account_id.is_empty() {
        return caller.account_id == author.account_id;
    }

    match (&caller.email_address, &author.email_address) {
        (Some(a), Some(b)) => !a.is_empty() && a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// PATCH /ticket/:key/comments/:id - only the author (or an admin) may edit
pub async fn update(
    jira: ResolvedJira,
    Path((key, comment_id)): Path<(String, String)>,
    Json(body): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Value>> {
    validate_issue_key(&key)?;
    validate_comment_id(&comment_id)?;
    let text = non_empty(body.body.as_deref()).ok_or_else(|| ApiError::bad_request("Missing comment body"))?;

    let current = jira.client.get_comment(&key, &comment_id).await?;

    if !body.is_admin {
        let caller = match jira.session.as_ref().and_then(|s| s.account_id.clone()) {
            Some(account_id) => JiraUser {
                account_id,
                ..JiraUser::default()
            },
            None => jira.client.myself().await?,
        };

        if !is_comment_author(&caller, &current.author) {
            tracing::info!(issue_key = %key, comment_id = %comment_id, "comment edit denied for non-author");
            return Err(ApiError::forbidden("Permission denied"));
        }
    }

    jira.client.update_comment(&key, &comment_id, text).await?;

    Ok(Json(json!({ "message": "Comment updated successfully" })))
}
