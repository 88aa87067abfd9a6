//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn WorkflowProgressCallback>`] via
//! [`crate::config::WorkflowConfigBuilder::progress_callback`] to receive an
//! event before and after each of the four pipeline stages. The CLI uses it
//! to drive its spinner; the web UI leaves it unset.
//!
//! # Example
//!
//! ```rust
//! use rules2variants::{Stage, WorkflowConfig, WorkflowProgressCallback};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl WorkflowProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("[{}/{}] {}", stage.number(), Stage::COUNT, stage.label());
//!     }
//! }
//!
//! let config = WorkflowConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Structure,
    Analyze,
    Generate,
}

impl Stage {
    pub const COUNT: usize = 4;

    /// 1-indexed position in the pipeline.
    pub fn number(self) -> usize {
        match self {
            Stage::Extract => 1,
            Stage::Structure => 2,
            Stage::Analyze => 3,
            Stage::Generate => 4,
        }
    }

    /// Human-readable description used in logs and the CLI spinner.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Extract => "Extracting PDF text",
            Stage::Structure => "Structuring rules",
            Stage::Analyze => "Analysing mechanics",
            Stage::Generate => "Generating creative variants",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Structure => "structure",
            Stage::Analyze => "analyze",
            Stage::Generate => "generate",
        };
        f.write_str(name)
    }
}

/// Called by the workflow as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait WorkflowProgressCallback: Send + Sync {
    /// Called just before a stage starts.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage returns successfully.
    ///
    /// # Arguments
    /// * `stage`     : the stage that finished
    /// * `output_len`: byte length of the text it produced
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }

    /// Called when a stage fails. The error is still returned to the caller.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the document has been assembled.
    fn on_workflow_complete(&self, document_len: usize) {
        let _ = document_len;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl WorkflowProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::WorkflowConfig`].
pub type ProgressCallback = Arc<dyn WorkflowProgressCallback>;
