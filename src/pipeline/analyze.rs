//! Rules structuring and mechanics analysis.
//!
//! Both stages are "extraction-like" and share the factual handle. Output is
//! trimmed and otherwise passed through verbatim: whether the model honoured
//! the Markdown skeleton is not checked here (see [`crate::validate`] for the
//! opt-in checks).

use crate::error::WorkflowError;
use crate::pipeline::llm::LlmBackend;
use crate::prompts::{analysis_prompt, structure_prompt};
use tracing::debug;

/// Raw PDF text → structured Markdown rules.
pub async fn structure_rules(
    raw_text: &str,
    llm: &dyn LlmBackend,
) -> Result<String, WorkflowError> {
    debug!(
        "Structuring {} chars with {}",
        raw_text.len(),
        llm.describe()
    );
    let response = llm.complete(&structure_prompt(raw_text)).await?;
    Ok(response.trim().to_string())
}

/// Structured rules → Markdown mechanics analysis.
pub async fn analyze_mechanics(
    structured_rules: &str,
    llm: &dyn LlmBackend,
) -> Result<String, WorkflowError> {
    debug!("Analysing mechanics with {}", llm.describe());
    let response = llm.complete(&analysis_prompt(structured_rules)).await?;
    Ok(response.trim().to_string())
}
