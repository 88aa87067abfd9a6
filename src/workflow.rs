//! Workflow orchestration: PDF → rules → analysis → variants → document.
//!
//! The run is a straight line with one early exit:
//!
//! ```text
//! Start ─▶ Extracted ─▶ Structured ─▶ Analyzed ─▶ Generated ─▶ Assembled
//!   │
//!   └─▶ Failed(EmptyText)   when the PDF has no extractable text
//! ```
//!
//! Stages are awaited one after the other. Each stage's output feeds the
//! next verbatim; any stage error is returned to the caller unchanged and
//! nothing is retried or partially returned.

use crate::config::WorkflowConfig;
use crate::error::{VcsError, WorkflowError};
use crate::output::WorkflowOutput;
use crate::pipeline::analyze::{analyze_mechanics, structure_rules};
use crate::pipeline::assemble::assemble_document;
use crate::pipeline::extract::{PdfSource, PdfiumExtractor, TextExtractor};
use crate::pipeline::generate::generate_variants;
use crate::pipeline::llm::{build_llm, LlmBackend};
use crate::progress::{ProgressCallback, Stage};
use crate::storage::{publish_key, ObjectStorage};
use crate::versioning::VersionControl;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A configured pipeline: one extractor and two LLM handles.
#[derive(Clone)]
pub struct Workflow {
    extractor: Arc<dyn TextExtractor>,
    factual: Arc<dyn LlmBackend>,
    creative: Arc<dyn LlmBackend>,
    progress: Option<ProgressCallback>,
}

impl Workflow {
    /// Assemble a workflow from explicit parts.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        factual: Arc<dyn LlmBackend>,
        creative: Arc<dyn LlmBackend>,
    ) -> Self {
        Self {
            extractor,
            factual,
            creative,
            progress: None,
        }
    }

    /// Pdfium extractor plus a factual and a creative handle built from
    /// `config`.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        let factual = build_llm(config, config.factual)?;
        let creative = build_llm(config, config.creative)?;
        let mut workflow = Self::new(Arc::new(PdfiumExtractor), factual, creative);
        workflow.progress = config.progress_callback.clone();
        Ok(workflow)
    }

    pub fn with_progress(mut self, cb: ProgressCallback) -> Self {
        self.progress = Some(cb);
        self
    }

    /// Run the four stages and assemble the document.
    ///
    /// # Errors
    /// - [`WorkflowError::EmptyText`] when extraction yields nothing; no LLM
    ///   call is made in that case
    /// - whatever the extractor or an LLM handle returned, unchanged
    pub async fn run(&self, source: &PdfSource) -> Result<WorkflowOutput, WorkflowError> {
        let start = Instant::now();
        let name = source.display_name();
        info!("Starting workflow: {}", name);

        let extract = async {
            let text = self.extractor.extract(source).await?;
            if text.is_empty() {
                let err = WorkflowError::EmptyText {
                    source_name: name.clone(),
                };
                warn!("{}", err);
                return Err(err);
            }
            Ok(text)
        };
        let raw_text = self.stage(Stage::Extract, extract).await?;

        let structured_rules = self
            .stage(
                Stage::Structure,
                structure_rules(&raw_text, self.factual.as_ref()),
            )
            .await?;

        let analysis = self
            .stage(
                Stage::Analyze,
                analyze_mechanics(&structured_rules, self.factual.as_ref()),
            )
            .await?;

        let variants = self
            .stage(
                Stage::Generate,
                generate_variants(&analysis, self.creative.as_ref()),
            )
            .await?;

        let document = assemble_document(&structured_rules, &analysis, &variants);

        info!(
            "Workflow complete: {} ({} chars, {}ms)",
            name,
            document.len(),
            start.elapsed().as_millis()
        );
        if let Some(ref cb) = self.progress {
            cb.on_workflow_complete(document.len());
        }

        Ok(WorkflowOutput {
            raw_text,
            structured_rules,
            analysis,
            variants,
            document,
        })
    }

    /// Log, notify, await one stage.
    async fn stage<F>(&self, stage: Stage, fut: F) -> Result<String, WorkflowError>
    where
        F: Future<Output = Result<String, WorkflowError>>,
    {
        info!("[{}/{}] {}…", stage.number(), Stage::COUNT, stage.label());
        if let Some(ref cb) = self.progress {
            cb.on_stage_start(stage);
        }

        let result = fut.await;

        if let Some(ref cb) = self.progress {
            match &result {
                Ok(text) => cb.on_stage_complete(stage, text.len()),
                Err(e) => cb.on_stage_error(stage, &e.to_string()),
            }
        }
        result
    }
}

/// Run the full pipeline on a PDF file.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use rules2variants::{run_workflow, WorkflowConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let output = run_workflow("bg_rules/catan.pdf", &WorkflowConfig::default()).await?;
///     println!("{}", output.document);
///     Ok(())
/// }
/// ```
pub async fn run_workflow(
    pdf_path: impl AsRef<Path>,
    config: &WorkflowConfig,
) -> Result<WorkflowOutput, WorkflowError> {
    let workflow = Workflow::from_config(config)?;
    workflow.run(&PdfSource::from_path(pdf_path.as_ref())).await
}

/// Synchronous wrapper around [`run_workflow`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_workflow_sync(
    pdf_path: impl AsRef<Path>,
    config: &WorkflowConfig,
) -> Result<WorkflowOutput, WorkflowError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| {
            WorkflowError::Internal(format!("Failed to create tokio runtime: {}", e))
        })?
        .block_on(run_workflow(pdf_path, config))
}

/// Write a Markdown document as UTF-8, creating parent directories.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn save_markdown(
    content: &str,
    output_path: impl AsRef<Path>,
) -> Result<(), WorkflowError> {
    let path = output_path.as_ref();
    let write_err = |source| WorkflowError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, content)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Saved {}", path.display());
    Ok(())
}

/// Steps after a document was saved: DVC/Git versioning, then upload.
///
/// Returns `Some(uploaded)` when `storage` is given, `None` otherwise.
///
/// # Errors
/// The first failing `dvc` / `git` command. Nothing is uploaded after it.
/// An upload failure is logged by [`ObjectStorage::publish`] and reported
/// as `Some(false)`.
pub async fn finalize(
    pdf: &Path,
    document_path: &Path,
    vcs: Option<&VersionControl>,
    storage: Option<&ObjectStorage>,
) -> Result<Option<bool>, VcsError> {
    if let Some(vcs) = vcs {
        vcs.track_pdf(pdf).await?;
        vcs.commit_markdown(document_path, None).await?;
    }

    let Some(storage) = storage else {
        return Ok(None);
    };
    let key = publish_key(document_path);
    info!(
        "Uploading {} to {}/{}",
        document_path.display(),
        storage.bucket_name(),
        key
    );
    Ok(Some(storage.publish(document_path, &key).await))
}

/// Game identifier derived from a PDF file name: stem, spaces → `_`,
/// lower-cased. `"Les Aventuriers du Rail.pdf"` → `"les_aventuriers_du_rail"`.
pub fn game_slug(pdf_name: impl AsRef<Path>) -> String {
    pdf_name
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().replace(' ', "_").to_lowercase())
        .unwrap_or_default()
}

/// `outputs/<game_slug>.md`.
pub fn default_output_path(pdf_path: impl AsRef<Path>) -> PathBuf {
    PathBuf::from("outputs").join(format!("{}.md", game_slug(pdf_path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_replaces_spaces_and_lowercases() {
        assert_eq!(
            game_slug("bg_rules/Les Aventuriers du Rail.pdf"),
            "les_aventuriers_du_rail"
        );
        assert_eq!(game_slug("CATAN.PDF"), "catan");
    }

    #[test]
    fn default_output_goes_to_outputs_dir() {
        assert_eq!(
            default_output_path("/data/Dixit Odyssey.pdf"),
            PathBuf::from("outputs/dixit_odyssey.md")
        );
    }

    #[tokio::test]
    async fn save_markdown_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/jeu.md");
        save_markdown("# Règles\n", &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Règles\n");
        assert!(!path.with_extension("md.tmp").exists());
    }
}
