//! Pipeline stages for rules-to-variants generation.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own with a stub [`llm::LlmBackend`].
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ structure ──▶ analyze ──▶ generate ──▶ assemble
//! (pdfium)    (factual LLM) (factual)   (creative)   (pure)
//! ```
//!
//! 1. [`extract`] : PDF path or bytes → raw text; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 2. [`llm`]     : the [`llm::LlmBackend`] seam and the handle factory
//! 3. [`analyze`] : raw text → structured rules → mechanics analysis
//! 4. [`generate`]: analysis → three creative variants
//! 5. [`assemble`]: concatenation into the final Markdown document

pub mod analyze;
pub mod assemble;
pub mod extract;
pub mod generate;
pub mod llm;
