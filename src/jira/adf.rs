//! Atlassian Document Format helpers.
//!
//! Jira v3 stores descriptions and comment bodies as ADF trees. Incoming
//! text is wrapped into a minimal document, and outgoing documents are
//! flattened back to plain text for the assistant client.

use serde_json::{json, Value};

/// Wrap plain text into an ADF document, one paragraph per line.
pub fn paragraph_doc(text: &str) -> Value {
    let content: Vec<Value> = text
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .map(|line| {
            if line.is_empty() {
                json!({ "type": "paragraph", "content": [] })
            } else {
                json!({
                    "type": "paragraph",
                    "content": [{ "type": "text", "text": line }]
                })
            }
        })
        .collect();

    json!({
        "type": "doc",
        "version": 1,
        "content": content
    })
}

/// Flatten an ADF value into plain text.
///
/// Plain strings are returned unchanged and `null` becomes an empty string,
/// since older Jira fields and v2 payloads are not ADF.
pub fn to_plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(_) => {
            let mut out = String::new();
            walk(value, &mut out);
            out.trim_end_matches('\n').to_string()
        }
        Value::Array(items) => items
            .iter()
            .map(to_plain_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn walk(node: &Value, out: &mut String) {
    let node_type = node.get("type").and_then(Value::as_str).unwrap_or_default();

    match node_type {
        "text" => {
            if let Some(text) = node.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        "hardBreak" => out.push('\n'),
        "mention" | "emoji" => {
            if let Some(text) = node
                .get("attrs")
                .and_then(|a| a.get("text").or_else(|| a.get("shortName")))
                .and_then(Value::as_str)
            {
                out.push_str(text);
            }
        }
        _ => {
            if let Some(children) = node.get("content").and_then(Value::as_array) {
                for child in children {
                    walk(child, out);
                }
            }
            if is_block(node_type) && !out.ends_with('\n') && !out.is_empty() {
                out.push('\n');
            }
        }
    }
}

fn is_block(node_type: &str) -> bool {
    matches!(
        node_type,
        "paragraph" | "heading" | "codeBlock" | "blockquote" | "listItem" | "rule" | "panel" | "tableRow"
    )
}
