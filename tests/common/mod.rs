//! Shared helpers for integration tests: stub backends, stub extractors and
//! a tiny PDF writer.

#![allow(dead_code)]

use async_trait::async_trait;
use rules2variants::{
    LlmBackend, PdfSource, Stage, TextExtractor, WorkflowError, WorkflowProgressCallback,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Skip the test unless a pdfium library is available without downloading.
#[allow(unused_macros)]
macro_rules! skip_without_pdfium {
    () => {
        if std::env::var("PDFIUM_LIB_PATH").is_err() && !pdfium_auto::is_pdfium_cached() {
            println!("SKIP: pdfium not available (set PDFIUM_LIB_PATH or run the CLI once)");
            return;
        }
    };
}

// ── LLM stubs ────────────────────────────────────────────────────────────────

/// Returns scripted replies in order, recording every prompt.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompt(&self, idx: usize) -> String {
        self.prompts.lock().unwrap()[idx].clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| WorkflowError::Inference {
                stage: self.describe(),
                message: "no scripted reply left".into(),
            })
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

/// Always fails like an unreachable service.
pub struct DownLlm;

#[async_trait]
impl LlmBackend for DownLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, WorkflowError> {
        Err(WorkflowError::Inference {
            stage: self.describe(),
            message: "connection refused".into(),
        })
    }

    fn describe(&self) -> String {
        "down".into()
    }
}

// ── Extractor stubs ──────────────────────────────────────────────────────────

/// Returns the same text for any source.
pub struct FixedExtractor(pub String);

#[async_trait]
impl TextExtractor for FixedExtractor {
    async fn extract(&self, _source: &PdfSource) -> Result<String, WorkflowError> {
        Ok(self.0.clone())
    }
}

/// Text per file name; unknown names are treated as corrupt PDFs.
pub struct MapExtractor(pub HashMap<String, String>);

#[async_trait]
impl TextExtractor for MapExtractor {
    async fn extract(&self, source: &PdfSource) -> Result<String, WorkflowError> {
        let name = source.display_name();
        self.0
            .get(&name)
            .cloned()
            .ok_or(WorkflowError::CorruptPdf {
                source_name: name,
                detail: "stub: not a PDF".into(),
            })
    }
}

// ── Progress recorder ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Recorder(pub Mutex<Vec<String>>);

impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl WorkflowProgressCallback for Recorder {
    fn on_stage_start(&self, stage: Stage) {
        self.0.lock().unwrap().push(format!("start:{stage}"));
    }
    fn on_stage_complete(&self, stage: Stage, _len: usize) {
        self.0.lock().unwrap().push(format!("done:{stage}"));
    }
    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.0.lock().unwrap().push(format!("error:{stage}"));
    }
    fn on_workflow_complete(&self, _len: usize) {
        self.0.lock().unwrap().push("complete".into());
    }
}

// ── Minimal PDF writer ───────────────────────────────────────────────────────

/// A one-page PDF. With `Some(text)` the page draws `text` in Helvetica;
/// with `None` the page has an empty content stream (no text layer).
///
/// `text` must not contain `(`, `)` or `\`.
pub fn minimal_pdf(text: Option<&str>) -> Vec<u8> {
    let content = match text {
        Some(t) => format!("BT /F1 24 Tf 72 720 Td ({t}) Tj ET"),
        None => String::new(),
    };
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
    }

    let xref = out.len();
    out.extend_from_slice(
        format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
    );
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    out
}
