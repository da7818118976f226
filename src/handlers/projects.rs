use axum::Json;

use crate::error::ApiResult;
use crate::jira::models::ProjectSummary;
use crate::middleware::ResolvedJira;

/// GET /projects - projects visible to the caller
pub async fn list(jira: ResolvedJira) -> ApiResult<Json<Vec<ProjectSummary>>> {
    let projects = jira.client.list_projects().await?;
    Ok(Json(projects))
}
