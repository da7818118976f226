//! Impact result export as CSV or DOCX.

pub mod csv;
pub mod docx;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => csv::CONTENT_TYPE,
            ExportFormat::Docx => docx::CONTENT_TYPE,
        }
    }
}

/// `Content-Disposition` value for a download named after the query.
pub fn content_disposition(slug: &str, format: ExportFormat) -> String {
    let slug = if slug.is_empty() { "results" } else { slug };
    format!("attachment; filename=\"impact-{}.{}\"", slug, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_lowercase_names() {
        let csv: ExportFormat = serde_json::from_str("\"csv\"").unwrap();
        let docx: ExportFormat = serde_json::from_str("\"docx\"").unwrap();
        assert_eq!(csv, ExportFormat::Csv);
        assert_eq!(docx, ExportFormat::Docx);
        assert!(serde_json::from_str::<ExportFormat>("\"pdf\"").is_err());
        assert_eq!(ExportFormat::default(), ExportFormat::Csv);
    }

    #[test]
    fn disposition_uses_slug_and_extension() {
        assert_eq!(
            content_disposition("label-checkout", ExportFormat::Docx),
            "attachment; filename=\"impact-label-checkout.docx\""
        );
        assert_eq!(content_disposition("", ExportFormat::Csv), "attachment; filename=\"impact-results.csv\"");
    }
}
