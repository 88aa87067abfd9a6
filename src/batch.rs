//! Batch text extraction: every PDF in a directory → one `.txt` each.
//!
//! Files are processed one at a time in sorted order. A file that fails is
//! recorded in the [`BatchReport`] and the run moves on; only a missing
//! source directory or an unwritable output directory stops the batch.

use crate::error::WorkflowError;
use crate::output::{BatchEntry, BatchReport};
use crate::pipeline::extract::{PdfSource, PdfiumExtractor, TextExtractor};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default source directory of the batch tool.
pub const DEFAULT_SOURCE_DIR: &str = "bg_rules";
/// Default output directory of the batch tool.
pub const DEFAULT_OUTPUT_DIR: &str = "output_rules";

/// Extract every PDF of `src_dir` with pdfium.
pub async fn batch_extract(
    src_dir: impl AsRef<Path>,
    dst_dir: impl AsRef<Path>,
) -> Result<BatchReport, WorkflowError> {
    batch_extract_with(&PdfiumExtractor, src_dir, dst_dir, |_| {}).await
}

/// Extract every PDF of `src_dir` with `extractor`, calling `on_file` after
/// each file.
pub async fn batch_extract_with<F>(
    extractor: &dyn TextExtractor,
    src_dir: impl AsRef<Path>,
    dst_dir: impl AsRef<Path>,
    mut on_file: F,
) -> Result<BatchReport, WorkflowError>
where
    F: FnMut(&BatchEntry),
{
    let src_dir = src_dir.as_ref();
    let dst_dir = dst_dir.as_ref();

    let pdfs = list_pdfs(src_dir)?;

    tokio::fs::create_dir_all(dst_dir)
        .await
        .map_err(|source| WorkflowError::OutputWriteFailed {
            path: dst_dir.to_path_buf(),
            source,
        })?;

    let mut report = BatchReport {
        output_dir: dst_dir.to_path_buf(),
        entries: Vec::with_capacity(pdfs.len()),
    };

    if pdfs.is_empty() {
        info!("No PDF found in {}", src_dir.display());
        return Ok(report);
    }

    info!(
        "Extracting {} PDF(s) from {}",
        pdfs.len(),
        src_dir.display()
    );

    for pdf in pdfs {
        let file = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = text_output_path(dst_dir, &pdf);

        let result = match extractor.extract(&PdfSource::from_path(&pdf)).await {
            // Empty text is written as an empty file, not an error.
            Ok(text) => tokio::fs::write(&target, text)
                .await
                .map_err(|source| WorkflowError::OutputWriteFailed {
                    path: target.clone(),
                    source,
                }),
            Err(e) => Err(e),
        };

        let entry = match result {
            Ok(()) => {
                info!("{} → {}", file, target.display());
                BatchEntry {
                    file,
                    output: Some(target),
                    error: None,
                }
            }
            Err(e) => {
                warn!("{}: {}", file, e);
                BatchEntry {
                    file,
                    output: None,
                    error: Some(e.to_string()),
                }
            }
        };
        on_file(&entry);
        report.entries.push(entry);
    }

    info!(
        "Batch done: {}/{} extracted",
        report.succeeded(),
        report.total()
    );
    Ok(report)
}

/// `*.pdf` files (case-insensitive) directly inside `dir`, sorted by name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, WorkflowError> {
    if !dir.is_dir() {
        return Err(WorkflowError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|_| WorkflowError::DirectoryNotFound {
        path: dir.to_path_buf(),
    })?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_pdf(p))
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// `<dst_dir>/<pdf stem>.txt`
pub fn text_output_path(dst_dir: &Path, pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dst_dir.join(format!("{stem}.txt"))
}
