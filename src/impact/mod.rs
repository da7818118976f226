//! Impact analysis: JQL searches for tickets related to a label, component,
//! summary keyword or an existing ticket, filtered down to useful results.

use serde::Serialize;
use serde_json::Value;

use crate::config::ImpactConfig;
use crate::jira::models::Issue;
use crate::jira::{jql, JiraClient, JiraError};

/// Shortest word considered when deriving a fallback keyword from a summary.
const MIN_KEYWORD_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactKind {
    Label,
    Component,
    /// Summary keyword search (module or title).
    Module,
}

impl ImpactKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "label" => Some(ImpactKind::Label),
            "component" => Some(ImpactKind::Component),
            "module" => Some(ImpactKind::Module),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactKind::Label => "label",
            ImpactKind::Component => "component",
            ImpactKind::Module => "module",
        }
    }

    pub fn jql(&self, project: &str, value: &str) -> String {
        match self {
            ImpactKind::Label => jql::by_label(project, value),
            ImpactKind::Component => jql::by_component(project, value),
            ImpactKind::Module => jql::by_summary(project, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImpactQuery {
    By(ImpactKind, String),
    /// Tickets related to an existing ticket.
    Ticket(String),
}

impl ImpactQuery {
    /// Short name used for export file names.
    pub fn slug(&self) -> String {
        let raw = match self {
            ImpactQuery::By(kind, value) => format!("{}-{}", kind.as_str(), value),
            ImpactQuery::Ticket(key) => format!("ticket-{}", key),
        };
        let slug: String = raw
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '-' })
            .collect();
        slug.trim_matches('-').to_string()
    }

    pub fn title(&self) -> String {
        match self {
            ImpactQuery::By(kind, value) => format!("Impact analysis: {} \"{}\"", kind.as_str(), value),
            ImpactQuery::Ticket(key) => format!("Impact analysis: tickets related to {}", key),
        }
    }
}

/// Decides which search hits are worth returning.
#[derive(Debug, Clone)]
pub struct ImpactFilter {
    pub source_key: Option<String>,
    pub parent_issue_types: Vec<String>,
    pub min_description_words: usize,
}

impl ImpactFilter {
    pub fn new(config: &ImpactConfig, source_key: Option<String>) -> Self {
        Self {
            source_key,
            parent_issue_types: config.parent_issue_types.clone(),
            min_description_words: config.min_description_words,
        }
    }

    pub fn keep(&self, issue: &Issue) -> bool {
        if let Some(source) = &self.source_key {
            if issue.key.eq_ignore_ascii_case(source) {
                return false;
            }
        }

        !(self.is_parent(issue) && self.is_under_specified(issue))
    }

    fn is_parent(&self, issue: &Issue) -> bool {
        let issue_type = issue.issue_type_name();
        issue.has_subtasks()
            || self
                .parent_issue_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(issue_type))
    }

    fn is_under_specified(&self, issue: &Issue) -> bool {
        issue.description_text().split_whitespace().count() < self.min_description_words
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactItem {
    pub key: String,
    pub summary: String,
    /// Plain text, or the raw ADF document when requested.
    pub description: Value,
    pub issue_type: String,
    pub status: String,
}

impl ImpactItem {
    pub fn from_issue(issue: &Issue, raw: bool) -> Self {
        let description = if raw {
            issue.fields.description.clone()
        } else {
            Value::String(issue.description_text())
        };

        Self {
            key: issue.key.clone(),
            summary: issue.fields.summary.clone(),
            description,
            issue_type: issue.issue_type_name().to_string(),
            status: issue.status_name().to_string(),
        }
    }

    /// Description as plain text regardless of how it was captured.
    pub fn description_text(&self) -> String {
        crate::jira::adf::to_plain_text(&self.description)
    }
}

/// Pick the longest word of a summary as a fallback search keyword.
pub fn keyword_from_summary(summary: &str) -> Option<String> {
    summary
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .fold(None::<&str>, |best, word| match best {
            Some(b) if b.chars().count() >= word.chars().count() => Some(b),
            _ => Some(word),
        })
        .map(str::to_string)
}

/// Run an impact query and return the filtered items.
#[tracing::instrument(skip(client, config))]
pub async fn analyze(
    client: &JiraClient,
    project: &str,
    query: &ImpactQuery,
    config: &ImpactConfig,
    max_results: u32,
    raw: bool,
) -> Result<Vec<ImpactItem>, JiraError> {
    let (jql, filter) = match query {
        ImpactQuery::By(kind, value) => (kind.jql(project, value), ImpactFilter::new(config, None)),
        ImpactQuery::Ticket(key) => {
            let source = client.get_issue(key).await?;
            let filter = ImpactFilter::new(config, Some(source.key.clone()));

            let jql = match jql::related_to(project, &source.key, &source.fields.labels, &source.component_names()) {
                Some(jql) => jql,
                None => match keyword_from_summary(&source.fields.summary) {
                    Some(keyword) => jql::by_summary_excluding(project, &keyword, &source.key),
                    None => {
                        tracing::debug!(source = %source.key, "nothing to correlate on");
                        return Ok(Vec::new());
                    }
                },
            };
            (jql, filter)
        }
    };

    let issues = client.search(&jql, max_results).await?;
    let total = issues.len();
    let items: Vec<ImpactItem> = issues
        .iter()
        .filter(|issue| filter.keep(issue))
        .map(|issue| ImpactItem::from_issue(issue, raw))
        .collect();

    tracing::info!(total, kept = items.len(), "impact analysis complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ImpactConfig {
        ImpactConfig {
            max_results: 100,
            min_description_words: 5,
            parent_issue_types: vec!["Epic".to_string()],
        }
    }

    fn issue(key: &str, issue_type: &str, description: &str, subtasks: usize) -> Issue {
        serde_json::from_value(json!({
            "key": key,
            "fields": {
                "summary": format!("summary of {}", key),
                "description": crate::jira::adf::paragraph_doc(description),
                "issuetype": { "name": issue_type },
                "status": { "name": "To Do" },
                "subtasks": (0..subtasks).map(|i| json!({ "key": format!("SUB-{}", i) })).collect::<Vec<_>>()
            }
        }))
        .unwrap()
    }

    #[test]
    fn excludes_source_ticket_case_insensitively() {
        let filter = ImpactFilter::new(&config(), Some("PAY-7".to_string()));
        assert!(!filter.keep(&issue("pay-7", "Bug", "a perfectly detailed bug report here", 0)));
        assert!(filter.keep(&issue("PAY-8", "Bug", "", 0)));
    }

    #[test]
    fn skips_under_specified_epics() {
        let filter = ImpactFilter::new(&config(), None);
        assert!(!filter.keep(&issue("PAY-1", "Epic", "todo", 0)));
        assert!(!filter.keep(&issue("PAY-2", "epic", "", 0)));
        assert!(filter.keep(&issue("PAY-3", "Epic", "migrate checkout to the new payment gateway", 0)));
    }

    #[test]
    fn skips_under_specified_parents_of_any_type() {
        let filter = ImpactFilter::new(&config(), None);
        assert!(!filter.keep(&issue("PAY-4", "Story", "see subtasks", 2)));
        assert!(filter.keep(&issue("PAY-5", "Story", "see subtasks", 0)));
        assert!(filter.keep(&issue("PAY-6", "Story", "one two three four five six", 2)));
    }

    #[test]
    fn items_carry_plain_or_raw_description() {
        let source = issue("PAY-9", "Task", "hello world", 0);
        let plain = ImpactItem::from_issue(&source, false);
        assert_eq!(plain.description, json!("hello world"));
        assert_eq!(plain.issue_type, "Task");
        assert_eq!(plain.status, "To Do");

        let raw = ImpactItem::from_issue(&source, true);
        assert_eq!(raw.description["type"], "doc");
        assert_eq!(raw.description_text(), "hello world");
    }

    #[test]
    fn keyword_prefers_longest_then_first() {
        assert_eq!(keyword_from_summary("Refund fails for EU cards").as_deref(), Some("Refund"));
        assert_eq!(keyword_from_summary("Checkout crash on iOS").as_deref(), Some("Checkout"));
        assert_eq!(keyword_from_summary("a b c").as_deref(), None);
        assert_eq!(keyword_from_summary("").as_deref(), None);
    }

    #[test]
    fn kind_parse_and_slug() {
        assert_eq!(ImpactKind::parse("label"), Some(ImpactKind::Label));
        assert_eq!(ImpactKind::parse("ticket"), None);
        let query = ImpactQuery::By(ImpactKind::Component, "Billing API".to_string());
        assert_eq!(query.slug(), "component-billing-api");
        assert_eq!(ImpactQuery::Ticket("PAY-7".to_string()).slug(), "ticket-pay-7");
    }
}
