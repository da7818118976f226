// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::jira::client::JiraError;
use crate::oauth::client::OAuthError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (Jira or Atlassian unreachable / malformed)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),

    // Jira answered with a non-success status; pass it through untouched
    Upstream { status: u16, body: String },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::Upstream { status, .. } => *status,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Upstream { body, .. } => body,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Upstream { .. } => "UPSTREAM_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<JiraError> for ApiError {
    fn from(err: JiraError) -> Self {
        match err {
            JiraError::Status { status, body } => ApiError::Upstream { status, body },
            JiraError::Http(e) => {
                tracing::error!("Jira request failed: {}", e);
                ApiError::bad_gateway(format!("Jira request failed: {}", e))
            }
            JiraError::Parse(msg) => {
                tracing::error!("Unexpected Jira response: {}", msg);
                ApiError::bad_gateway(format!("Unexpected Jira response: {}", msg))
            }
        }
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::Status { status, body } => ApiError::Upstream { status, body },
            OAuthError::Http(e) => {
                tracing::error!("Atlassian OAuth request failed: {}", e);
                ApiError::bad_gateway("Atlassian authorization server unreachable")
            }
            OAuthError::Parse(msg) => {
                tracing::error!("Unexpected Atlassian OAuth response: {}", msg);
                ApiError::bad_gateway("Unexpected response from Atlassian authorization server")
            }
            OAuthError::NotConfigured => {
                ApiError::service_unavailable("OAuth is not configured on this server")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(self.to_json())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_passes_through() {
        let err: ApiError = JiraError::Status {
            status: 404,
            body: "Issue does not exist".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_json()["error"], "Issue does not exist");
        assert_eq!(err.to_json()["code"], "UPSTREAM_ERROR");
    }

    #[test]
    fn parse_errors_become_bad_gateway() {
        let err: ApiError = JiraError::Parse("missing fields".to_string()).into();
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn invalid_upstream_status_falls_back_to_bad_gateway() {
        let response = ApiError::Upstream { status: 42, body: String::new() }.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
