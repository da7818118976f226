//! Upstream Jira v3 payloads, trimmed to the fields this service reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::adf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSummary {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub status: Option<Named>,
    #[serde(default)]
    pub issuetype: Option<Named>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub components: Vec<Named>,
    #[serde(default)]
    pub subtasks: Vec<Value>,
    #[serde(default)]
    pub parent: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub name: String,
}

impl Issue {
    pub fn status_name(&self) -> &str {
        self.fields.status.as_ref().map(|s| s.name.as_str()).unwrap_or_default()
    }

    pub fn issue_type_name(&self) -> &str {
        self.fields.issuetype.as_ref().map(|t| t.name.as_str()).unwrap_or_default()
    }

    pub fn component_names(&self) -> Vec<String> {
        self.fields.components.iter().map(|c| c.name.clone()).collect()
    }

    pub fn description_text(&self) -> String {
        adf::to_plain_text(&self.fields.description)
    }

    pub fn has_subtasks(&self) -> bool {
        !self.fields.subtasks.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub author: JiraUser,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub created: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSummary {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
}

/// Partial update for `PUT /issue/{key}`; `None` leaves the field alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueUpdate {
    pub summary: Option<String>,
    pub description: Option<String>,
}

impl IssueUpdate {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.description.is_none()
    }

    pub fn to_fields(&self) -> serde_json::Map<String, Value> {
        let mut fields = serde_json::Map::new();
        if let Some(summary) = &self.summary {
            fields.insert("summary".to_string(), Value::String(summary.clone()));
        }
        if let Some(description) = &self.description {
            fields.insert("description".to_string(), adf::paragraph_doc(description));
        }
        fields
    }
}
