// src/services/extractor.rs

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use lopdf::Document;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("The uploaded file is not a readable PDF: {0}")]
    InvalidDocument(String),

    #[error("No extractable text found in the PDF. Scanned documents are not supported.")]
    NoExtractableText,
}

/// Decodes a Base64 PDF payload, dropping a `data:...;base64,` header if present.
pub fn decode_pdf_payload(payload: &str) -> Result<Vec<u8>, ExtractionError> {
    let body = match payload.trim_start().strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ExtractionError::InvalidDocument("malformed data URL".to_string()))?,
        None => payload,
    };

    let cleaned: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    BASE64
        .decode(cleaned.as_bytes())
        .map_err(|e| ExtractionError::InvalidDocument(format!("invalid base64: {}", e)))
}

/// Extracts the text of every page, in page order.
///
/// Fragments within a page are joined by single spaces and every page is
/// followed by a newline.
pub fn extract_text(pdf: &[u8]) -> Result<String, ExtractionError> {
    let document =
        Document::load_mem(pdf).map_err(|e| ExtractionError::InvalidDocument(e.to_string()))?;

    let mut text = String::new();
    // get_pages() is keyed by page number, so iteration follows page order.
    for page_number in document.get_pages().keys() {
        let page_text = document
            .extract_text(&[*page_number])
            .map_err(|e| {
                ExtractionError::InvalidDocument(format!("page {}: {}", page_number, e))
            })?;

        let fragments: Vec<&str> = page_text.split_whitespace().collect();
        text.push_str(&fragments.join(" "));
        text.push('\n');
    }

    if text.trim().is_empty() {
        return Err(ExtractionError::NoExtractableText);
    }

    Ok(text)
}

/// Decodes and parses an uploaded PDF on the blocking pool.
pub async fn extract_from_base64(payload: String) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || {
        let bytes = decode_pdf_payload(&payload)?;
        extract_text(&bytes)
    })
    .await
    .map_err(|e| {
        tracing::error!("PDF extraction task failed: {:?}", e);
        ExtractionError::InvalidDocument("the PDF could not be processed".to_string())
    })?
}
