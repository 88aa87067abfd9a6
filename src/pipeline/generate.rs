//! Creative variant generation.
//!
//! The prompt asks for exactly three variants; the count is an instruction
//! to the model only. Under- or over-generation is passed through.

use crate::error::WorkflowError;
use crate::pipeline::llm::LlmBackend;
use crate::prompts::variants_prompt;
use tracing::debug;

/// Mechanics analysis → Markdown with three variants.
pub async fn generate_variants(
    analysis: &str,
    llm: &dyn LlmBackend,
) -> Result<String, WorkflowError> {
    debug!("Generating variants with {}", llm.describe());
    let response = llm.complete(&variants_prompt(analysis)).await?;
    Ok(response.trim().to_string())
}
