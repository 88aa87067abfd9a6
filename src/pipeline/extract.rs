//! Text extraction: read a PDF and return its concatenated page text.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which uses thread-local
//! state and is not safe to call from async contexts. [`extract_text`] moves
//! the work onto Tokio's blocking pool; [`extract_text_blocking`] is the same
//! routine for callers that are not in a runtime.
//!
//! Path and byte sources go through the same page-text routine, so the same
//! document yields the same text whichever way it was handed in.

use crate::error::WorkflowError;
use async_trait::async_trait;
use pdfium_render::prelude::{PdfDocument, Pdfium, PdfiumError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the PDF comes from.
#[derive(Debug, Clone)]
pub enum PdfSource {
    /// A file on disk (CLI, batch tool).
    Path(PathBuf),
    /// An in-memory upload (web UI). `name` is only used in messages.
    Bytes { name: String, bytes: Vec<u8> },
}

impl PdfSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        PdfSource::Path(path.into())
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        PdfSource::Bytes {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// File name (or upload name) for log and error messages.
    pub fn display_name(&self) -> String {
        match self {
            PdfSource::Path(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string()),
            PdfSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// Anything that can turn a [`PdfSource`] into raw text.
///
/// [`PdfiumExtractor`] is the production implementation; tests and
/// alternative engines plug in here.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Return the document text, `""` when no page has extractable text.
    async fn extract(&self, source: &PdfSource) -> Result<String, WorkflowError>;
}

/// Extracts text with pdfium.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumExtractor;

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn extract(&self, source: &PdfSource) -> Result<String, WorkflowError> {
        extract_text(source).await
    }
}

/// Extract the text of every page, off the async executor.
pub async fn extract_text(source: &PdfSource) -> Result<String, WorkflowError> {
    let source = source.clone();
    tokio::task::spawn_blocking(move || extract_text_blocking(&source))
        .await
        .map_err(|e| {
            WorkflowError::Internal(format!("Extraction task panicked: {}", e))
        })?
}

/// Blocking implementation of text extraction.
pub fn extract_text_blocking(source: &PdfSource) -> Result<String, WorkflowError> {
    let name = source.display_name();

    if let PdfSource::Path(path) = source {
        check_readable(path)?;
    }

    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| WorkflowError::PdfiumBindingFailed(e.to_string()))?;

    let document = load_document(&pdfium, source).map_err(|e| WorkflowError::CorruptPdf {
        source_name: name.clone(),
        detail: format!("{:?}", e),
    })?;

    let pages = document.pages();
    info!("PDF loaded: {} ({} pages)", name, pages.len());

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        match page.text() {
            Ok(text) => texts.push(text.all()),
            Err(e) => warn!("{}: no text layer on page {}: {:?}", name, idx + 1, e),
        }
    }

    let text = join_page_texts(texts);
    debug!("Extracted {} chars from {}", text.len(), name);
    Ok(text)
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    source: &'a PdfSource,
) -> Result<PdfDocument<'a>, PdfiumError> {
    match source {
        PdfSource::Path(path) => pdfium.load_pdf_from_file(path, None),
        PdfSource::Bytes { bytes, .. } => pdfium.load_pdf_from_byte_slice(bytes, None),
    }
}

/// Concatenate non-empty page texts, one newline after each, then trim.
pub fn join_page_texts<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut text = String::new();
    for page in pages.into_iter().filter(|p| !p.is_empty()) {
        text.push_str(&page);
        text.push('\n');
    }
    text.trim().to_string()
}

/// Validate that a local file exists and can be opened.
fn check_readable(path: &Path) -> Result<(), WorkflowError> {
    if !path.exists() {
        return Err(WorkflowError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(WorkflowError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(WorkflowError::CorruptPdf {
            source_name: path.display().to_string(),
            detail: e.to_string(),
        }),
    }
}
