//! JQL builders for impact searches.
//!
//! Every user-provided value goes through [`quote`] so a label such as
//! `x" OR project != "Y` cannot widen the query.

const ORDER_BY: &str = " ORDER BY updated DESC";

/// Render a JQL string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' | '\r' | '\t' => out.push(' '),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn list(values: &[String]) -> String {
    values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
}

pub fn by_label(project: &str, label: &str) -> String {
    format!("project = {} AND labels = {}{}", quote(project), quote(label), ORDER_BY)
}

pub fn by_component(project: &str, component: &str) -> String {
    format!("project = {} AND component = {}{}", quote(project), quote(component), ORDER_BY)
}

pub fn by_summary(project: &str, keyword: &str) -> String {
    format!("project = {} AND summary ~ {}{}", quote(project), quote(keyword), ORDER_BY)
}

/// Tickets sharing a label or component with `source_key`, excluding the source itself.
///
/// Returns `None` when there is nothing to correlate on.
pub fn related_to(project: &str, source_key: &str, labels: &[String], components: &[String]) -> Option<String> {
    let mut clauses = Vec::new();
    if !labels.is_empty() {
        clauses.push(format!("labels in ({})", list(labels)));
    }
    if !components.is_empty() {
        clauses.push(format!("component in ({})", list(components)));
    }
    if clauses.is_empty() {
        return None;
    }

    Some(format!(
        "project = {} AND key != {} AND ({}){}",
        quote(project),
        quote(source_key),
        clauses.join(" OR "),
        ORDER_BY
    ))
}

/// Summary search that still keeps the source ticket out of the result set.
pub fn by_summary_excluding(project: &str, keyword: &str, source_key: &str) -> String {
    format!(
        "project = {} AND key != {} AND summary ~ {}{}",
        quote(project),
        quote(source_key),
        quote(keyword),
        ORDER_BY
    )
}
