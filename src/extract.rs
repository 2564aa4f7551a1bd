//! Per-page text extraction for PDF documents.
//!
//! Text comes straight from `pdf-extract`'s layout heuristic; it is neither
//! cleaned up nor validated here. A page without extractable text produces
//! an empty string, so the output always has one entry per page.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Extracts the text of every page of the PDF at `path`, in document order.
pub fn extract_pdf_pages(path: &Path) -> Result<Vec<String>, ExtractError> {
    pdf_extract::extract_text_by_pages(path).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Same as [`extract_pdf_pages`] for a PDF already held in memory.
pub fn extract_pdf_pages_from_mem(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}
