//! Content-type detection for uploaded attachments.

const OCTET_STREAM: &str = "application/octet-stream";
const OOXML_PREFIX: &str = "application/vnd.openxmlformats-officedocument.";

/// Guess a MIME type from magic bytes, then from the file extension.
pub fn sniff_content_type(filename: &str, bytes: &[u8]) -> &'static str {
    if let Some(detected) = sniff_magic(bytes) {
        // Office Open XML files are ZIP containers; the extension tells them apart.
        if detected == "application/zip" {
            if let Some(mime) = from_extension(filename).filter(|m| m.starts_with(OOXML_PREFIX)) {
                return mime;
            }
        }
        return detected;
    }

    from_extension(filename).unwrap_or(OCTET_STREAM)
}

fn sniff_magic(bytes: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
    ];

    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
}

fn from_extension(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "md" => "text/markdown",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => return None,
    };
    Some(mime)
}
