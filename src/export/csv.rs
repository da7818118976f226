use crate::impact::ImpactItem;

pub const CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const HEADER: [&str; 5] = ["key", "summary", "issue_type", "status", "description"];

/// Quote a field when it contains a delimiter, quote or line break.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn row<'a>(out: &mut String, values: impl IntoIterator<Item = &'a str>) {
    let line = values.into_iter().map(field).collect::<Vec<_>>().join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

/// Render impact items as CSV with CRLF line endings.
pub fn render(items: &[ImpactItem]) -> String {
    let mut out = String::new();
    row(&mut out, HEADER);

    for item in items {
        let description = item.description_text();
        row(
            &mut out,
            [
                item.key.as_str(),
                item.summary.as_str(),
                item.issue_type.as_str(),
                item.status.as_str(),
                description.as_str(),
            ],
        );
    }

    out
}
