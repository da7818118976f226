use axum::{extract::Path, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{non_empty, validate_issue_key};
use crate::attachments::sniff_content_type;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ResolvedJira;

#[derive(Debug, Deserialize)]
pub struct UploadAttachmentRequest {
    pub filename: Option<String>,
    pub content_base64: Option<String>,
    pub content_type: Option<String>,
}

/// POST /ticket/:key/attachments - upload a base64-encoded file
pub async fn upload(
    jira: ResolvedJira,
    Path(key): Path<String>,
    Json(body): Json<UploadAttachmentRequest>,
) -> ApiResult<Json<Value>> {
    validate_issue_key(&key)?;

    let filename = non_empty(body.filename.as_deref())
        .ok_or_else(|| ApiError::bad_request("Missing filename"))?
        .to_string();
    if filename.contains(['/', '\\']) {
        return Err(ApiError::bad_request("Filename must not contain path separators"));
    }

    let encoded = non_empty(body.content_base64.as_deref())
        .ok_or_else(|| ApiError::bad_request("Missing attachment content"))?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| ApiError::bad_request("Attachment content is not valid base64"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Attachment content is empty"));
    }

    let content_type = non_empty(body.content_type.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| sniff_content_type(&filename, &bytes).to_string());

    tracing::debug!(issue_key = %key, %content_type, size = bytes.len(), "uploading attachment");
    let attachments = jira
        .client
        .add_attachment(&key, &filename, &content_type, bytes)
        .await?;

    Ok(Json(json!({
        "message": "Attachment uploaded successfully.",
        "attachments": attachments
    })))
}
