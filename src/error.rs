//! Error types for the rules2variants library.
//!
//! Three distinct error types reflect three distinct failure policies:
//!
//! * [`WorkflowError`] (**fatal**): the pipeline cannot proceed (missing
//!   file, unreadable PDF, empty extracted text, unreachable inference
//!   service). Returned from [`crate::workflow::Workflow::run`] and the
//!   `run_workflow*` helpers; nothing is caught or repaired on the way up.
//!
//! * [`StorageError`] (**non-fatal at the call site**): object-storage
//!   problems. The strict adapter methods return it, the lenient ones
//!   ([`crate::storage::ObjectStorage::publish`] and
//!   [`crate::storage::ObjectStorage::fetch`]) log it and swallow it.
//!
//! * [`VcsError`] (**fatal**): a `git` / `dvc` command could not be spawned
//!   or exited non-zero. Never swallowed; the CLI exits non-zero.
//!
//! A failed upload never aborts a run; a failed commit always does.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the generation pipeline.
#[derive(Debug, Error)]
pub enum WorkflowError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The PDF engine could not open or parse the document.
    #[error("PDF '{source_name}' could not be read: {detail}")]
    CorruptPdf { source_name: String, detail: String },

    /// Every page of the PDF came back without extractable text
    /// (typically a scanned, image-only document).
    #[error("Could not extract any text from '{source_name}'\nScanned PDFs need OCR before they can be processed.")]
    EmptyText { source_name: String },

    /// A batch-extraction source directory does not exist.
    #[error("Directory not found: '{path}'")]
    DirectoryNotFound { path: PathBuf },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The inference call failed (unreachable service, HTTP error,
    /// malformed response). Not retried.
    #[error("LLM call failed during {stage}: {message}")]
    Inference { stage: String, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// True for errors caused by the input document itself.
    ///
    /// The CLI maps these to exit code 1.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            WorkflowError::FileNotFound { .. }
                | WorkflowError::PermissionDenied { .. }
                | WorkflowError::CorruptPdf { .. }
                | WorkflowError::EmptyText { .. }
                | WorkflowError::DirectoryNotFound { .. }
        )
    }
}

/// Object-storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Credentials or endpoint could not be turned into a client.
    #[error("Invalid storage configuration: {0}")]
    Config(String),

    /// Checking for or creating the bucket failed.
    #[error("Bucket '{bucket}' unavailable: {detail}")]
    Bucket { bucket: String, detail: String },

    /// The PUT request failed.
    #[error("Upload of '{bucket}/{key}' failed: {detail}")]
    Upload {
        bucket: String,
        key: String,
        detail: String,
    },

    /// The GET request failed.
    #[error("Download of '{bucket}/{key}' failed: {detail}")]
    Download {
        bucket: String,
        key: String,
        detail: String,
    },

    /// Reading the local source or writing the local destination failed.
    #[error("Local file '{path}': {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Version-control command failures.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The executable could not be started (not installed, not on PATH).
    #[error("Could not run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited non-zero.
    #[error(
        "Command `{command}` failed with exit code {}",
        code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string())
    )]
    CommandFailed { command: String, code: Option<i32> },
}
