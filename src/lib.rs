//! # rules2variants
//!
//! Turn a board-game rules PDF into a Markdown document with three parts:
//! a structured rules summary, an analysis of the game's mechanics, and three
//! creative variants, all produced by a locally served LLM.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract    page text via pdfium (spawn_blocking)
//!  ├─ 2. Structure  raw text → rules summary        (factual handle, t=0.2)
//!  ├─ 3. Analyze    rules → mechanics analysis      (factual handle, t=0.2)
//!  ├─ 4. Generate   analysis → 3 variants           (creative handle, t=0.7)
//!  └─    Assemble   rules --- analysis --- ## Variantes créatives + variants
//! ```
//!
//! A PDF without extractable text stops the run before any model is called.
//! The finished document can be saved, committed with Git/DVC
//! ([`versioning`]) and published to S3-compatible storage ([`storage`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rules2variants::{run_workflow, save_markdown, WorkflowConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Talks to Ollama at http://localhost:11434 with the `mistral` model.
//!     let config = WorkflowConfig::default();
//!     let output = run_workflow("bg_rules/catan.pdf", &config).await?;
//!     save_markdown(&output.document, "outputs/catan.md").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | `rules2variants` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `web`   | on      | `rules2variants-web` binary (axum + tower-http) |
//!
//! Library-only users can opt out:
//! ```toml
//! rules2variants = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod storage;
pub mod validate;
pub mod versioning;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{batch_extract, batch_extract_with};
pub use config::{LlmConfig, StorageConfig, WorkflowConfig, WorkflowConfigBuilder};
pub use error::{StorageError, VcsError, WorkflowError};
pub use output::{BatchEntry, BatchReport, WorkflowOutput};
pub use pipeline::assemble::assemble_document;
pub use pipeline::extract::{extract_text, PdfSource, PdfiumExtractor, TextExtractor};
pub use pipeline::llm::{build_llm, LlmBackend, OllamaBackend, ProviderBackend};
pub use progress::{NoopProgressCallback, ProgressCallback, Stage, WorkflowProgressCallback};
pub use storage::{publish_key, ObjectStorage};
pub use validate::{validate_output, ValidationReport};
pub use versioning::VersionControl;
pub use workflow::{
    default_output_path, finalize, game_slug, run_workflow, run_workflow_sync, save_markdown,
    Workflow,
};
