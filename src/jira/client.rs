use std::time::Duration;

use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::adf;
use super::models::{
    AttachmentSummary, Comment, CommentPage, CreatedIssue, Issue, IssueUpdate, JiraUser, ProjectSummary,
    SearchResults,
};

/// Fields requested from search so impact filtering never needs a second round trip.
pub const SEARCH_FIELDS: &str = "summary,description,issuetype,status,labels,components,subtasks,parent";

#[derive(Debug, thiserror::Error)]
pub enum JiraError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Jira returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse Jira response: {0}")]
    Parse(String),
}

/// How a request authenticates against Jira.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Static account email + API token.
    Basic { email: String, token: String },
    /// OAuth 2.0 (3LO) access token for a per-user session.
    Bearer { token: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { email, .. } => f
                .debug_struct("Basic")
                .field("email", email)
                .field("token", &"[REDACTED]")
                .finish(),
            Credentials::Bearer { .. } => f.debug_struct("Bearer").field("token", &"[REDACTED]").finish(),
        }
    }
}

/// Where a request goes and with which credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraTarget {
    pub base_url: String,
    pub credentials: Credentials,
}

impl JiraTarget {
    /// Target for an OAuth session: `{api_base}/ex/jira/{cloud_id}`.
    pub fn for_cloud(api_base_url: &str, cloud_id: &str, access_token: &str) -> Self {
        Self {
            base_url: format!("{}/ex/jira/{}", api_base_url.trim_end_matches('/'), cloud_id),
            credentials: Credentials::Bearer {
                token: access_token.to_string(),
            },
        }
    }

    pub fn mode(&self) -> &'static str {
        match self.credentials {
            Credentials::Basic { .. } => "basic",
            Credentials::Bearer { .. } => "oauth",
        }
    }
}

/// Build the process-wide HTTP client shared by every Jira and OAuth call.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("jira-bridge/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Thin Jira Cloud REST v3 client bound to one target.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    target: JiraTarget,
}

impl JiraClient {
    pub fn new(http: reqwest::Client, target: JiraTarget) -> Self {
        Self { http, target }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.target.base_url, path);
        let builder = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json");

        match &self.target.credentials {
            Credentials::Basic { email, token } => builder.basic_auth(email, Some(token)),
            Credentials::Bearer { token } => builder.bearer_auth(token),
        }
    }

    async fn check(response: Response) -> Result<Response, JiraError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Jira request rejected");
        Err(JiraError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, JiraError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| JiraError::Parse(e.to_string()))
    }

    #[tracing::instrument(skip(self), fields(mode = self.target.mode()))]
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, JiraError> {
        let response = self.request(Method::GET, "/rest/api/3/project").send().await?;
        Self::json(response).await
    }

    #[tracing::instrument(skip(self, description), fields(mode = self.target.mode()))]
    pub async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        description: &str,
        issue_type: &str,
    ) -> Result<String, JiraError> {
        let payload = json!({
            "fields": {
                "project": { "key": project_key },
                "summary": summary,
                "description": adf::paragraph_doc(description),
                "issuetype": { "name": issue_type }
            }
        });

        let response = self
            .request(Method::POST, "/rest/api/3/issue")
            .json(&payload)
            .send()
            .await?;
        let created: CreatedIssue = Self::json(response).await?;
        tracing::info!(issue_key = %created.key, "created Jira issue");
        Ok(created.key)
    }

    #[tracing::instrument(skip(self), fields(mode = self.target.mode()))]
    pub async fn get_issue(&self, key: &str) -> Result<Issue, JiraError> {
        let response = self
            .request(Method::GET, &format!("/rest/api/3/issue/{}", key))
            .send()
            .await?;
        Self::json(response).await
    }

    #[tracing::instrument(skip(self, update), fields(mode = self.target.mode()))]
    pub async fn update_issue(&self, key: &str, update: &IssueUpdate) -> Result<(), JiraError> {
        let response = self
            .request(Method::PUT, &format!("/rest/api/3/issue/{}", key))
            .json(&json!({ "fields": update.to_fields() }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(mode = self.target.mode()))]
    pub async fn list_comments(&self, key: &str) -> Result<Vec<Comment>, JiraError> {
        let response = self
            .request(Method::GET, &format!("/rest/api/3/issue/{}/comment", key))
            .send()
            .await?;
        let page: CommentPage = Self::json(response).await?;
        Ok(page.comments)
    }

    #[tracing::instrument(skip(self), fields(mode = self.target.mode()))]
    pub async fn get_comment(&self, key: &str, comment_id: &str) -> Result<Comment, JiraError> {
        let response = self
            .request(Method::GET, &format!("/rest/api/3/issue/{}/comment/{}", key, comment_id))
            .send()
            .await?;
        Self::json(response).await
    }

    #[tracing::instrument(skip(self, text), fields(mode = self.target.mode()))]
    pub async fn add_comment(&self, key: &str, text: &str) -> Result<Comment, JiraError> {
        let response = self
            .request(Method::POST, &format!("/rest/api/3/issue/{}/comment", key))
            .json(&json!({ "body": adf::paragraph_doc(text) }))
            .send()
            .await?;
        Self::json(response).await
    }

    #[tracing::instrument(skip(self, text), fields(mode = self.target.mode()))]
    pub async fn update_comment(&self, key: &str, comment_id: &str, text: &str) -> Result<(), JiraError> {
        let response = self
            .request(Method::PUT, &format!("/rest/api/3/issue/{}/comment/{}", key, comment_id))
            .json(&json!({ "body": adf::paragraph_doc(text) }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(mode = self.target.mode()))]
    pub async fn search(&self, jql: &str, max_results: u32) -> Result<Vec<Issue>, JiraError> {
        let max_results = max_results.to_string();
        let response = self
            .request(Method::GET, "/rest/api/3/search/jql")
            .query(&[
                ("jql", jql),
                ("maxResults", max_results.as_str()),
                ("fields", SEARCH_FIELDS),
            ])
            .send()
            .await?;
        let results: SearchResults = Self::json(response).await?;
        tracing::debug!(count = results.issues.len(), "Jira search returned");
        Ok(results.issues)
    }

    #[tracing::instrument(skip(self), fields(mode = self.target.mode()))]
    pub async fn myself(&self) -> Result<JiraUser, JiraError> {
        let response = self.request(Method::GET, "/rest/api/3/myself").send().await?;
        Self::json(response).await
    }

    #[tracing::instrument(skip(self, bytes), fields(mode = self.target.mode(), size = bytes.len()))]
    pub async fn add_attachment(
        &self,
        key: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<AttachmentSummary>, JiraError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .request(Method::POST, &format!("/rest/api/3/issue/{}/attachments", key))
            .header("X-Atlassian-Token", "no-check")
            .multipart(form)
            .send()
            .await?;
        Self::json(response).await
    }
}
