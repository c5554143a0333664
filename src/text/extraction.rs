use lopdf::Document;
use tracing::{debug, warn};

use crate::error::ExtractionError;

/// Document kinds text can be pulled out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
}

impl DocumentKind {
    /// Detect the kind from the upload's content type, falling back to the file extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        match content_type.map(|t| t.split(';').next().unwrap_or(t).trim().to_lowercase()) {
            Some(t) if t == "text/plain" => return Some(DocumentKind::PlainText),
            Some(t) if t == "application/pdf" => return Some(DocumentKind::Pdf),
            _ => {}
        }

        let ext = file_name
            .and_then(|n| std::path::Path::new(n).extension())
            .map(|e| e.to_string_lossy().to_lowercase());
        match ext.as_deref() {
            Some("txt") => Some(DocumentKind::PlainText),
            Some("pdf") => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// Extract the text of an uploaded document.
pub fn extract(
    bytes: &[u8],
    content_type: Option<&str>,
    file_name: Option<&str>,
) -> Result<String, ExtractionError> {
    let kind = DocumentKind::detect(content_type, file_name).ok_or_else(|| {
        ExtractionError::UnsupportedType(
            content_type
                .or(file_name)
                .unwrap_or("unknown")
                .to_string(),
        )
    })?;

    match kind {
        DocumentKind::PlainText => Ok(decode_text(bytes)),
        DocumentKind::Pdf => extract_pdf(bytes),
    }
}

/// Decode text bytes, stripping a UTF-8 BOM and falling back to lossy decoding.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("Document is not valid UTF-8, decoding lossily");
            let (cow, _, _) = encoding_rs::UTF_8.decode(bytes);
            cow.into_owned()
        }
    }
}

/// Concatenate the text of every page. A page that fails to extract contributes nothing.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::Read(e.to_string()))?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!("Skipping PDF page {}: {}", page_number, e),
        }
    }
    Ok(text)
}
