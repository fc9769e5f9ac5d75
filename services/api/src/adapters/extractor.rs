//! services/api/src/adapters/extractor.rs
//!
//! Turns an uploaded document into one text blob. PDFs are read page by page
//! with `lopdf` and concatenated in document order; plain text is decoded as
//! UTF-8. There is no OCR and no layout reconstruction.

use lopdf::Document;
use study_notes_core::DocumentKind;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("text is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
    #[error("PDF parsing failed: {0}")]
    Pdf(String),
}

/// Extracts the text of a document of the given kind.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::PlainText => Ok(String::from_utf8(bytes.to_vec())?),
        DocumentKind::Pdf => extract_pdf_text(bytes),
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    if document.is_encrypted() {
        return Err(ExtractError::Pdf("document is encrypted".to_string()));
    }

    // `get_pages` is keyed by page number, so iteration is in document order.
    let pages = document.get_pages();
    let mut text = String::new();
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => debug!("No extractable text on page {}: {}", page_number, e),
        }
    }

    info!(
        "Extracted {} characters from a {}-page PDF.",
        text.chars().count(),
        pages.len()
    );
    Ok(text)
}
