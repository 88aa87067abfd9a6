//! Text extraction through pdfium. Skipped when no pdfium library is
//! available locally.

#[macro_use]
mod common;

use common::{minimal_pdf, ScriptedLlm};
use rules2variants::{extract_text, PdfSource, PdfiumExtractor, Workflow, WorkflowError};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread")]
async fn page_text_contains_objectif() {
    skip_without_pdfium!();

    let bytes = minimal_pdf(Some("Objectif du jeu"));
    let text = extract_text(&PdfSource::from_bytes("regles.pdf", bytes))
        .await
        .unwrap();
    assert!(text.contains("Objectif"), "got: {text:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn path_and_bytes_yield_identical_text() {
    skip_without_pdfium!();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("regles.pdf");
    let bytes = minimal_pdf(Some("Objectif : 10 points"));
    std::fs::write(&path, &bytes).unwrap();

    let from_path = extract_text(&PdfSource::from_path(&path)).await.unwrap();
    let from_bytes = extract_text(&PdfSource::from_bytes("regles.pdf", bytes))
        .await
        .unwrap();
    assert_eq!(from_path, from_bytes);
    assert!(!from_path.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn image_only_pdf_yields_empty_text_and_aborts_the_run() {
    skip_without_pdfium!();

    let bytes = minimal_pdf(None);
    let text = extract_text(&PdfSource::from_bytes("scan.pdf", bytes.clone()))
        .await
        .unwrap();
    assert_eq!(text, "");

    let factual = Arc::new(ScriptedLlm::new(["R", "A"]));
    let creative = Arc::new(ScriptedLlm::new(["V"]));
    let wf = Workflow::new(Arc::new(PdfiumExtractor), factual.clone(), creative.clone());
    let err = wf
        .run(&PdfSource::from_bytes("scan.pdf", bytes))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::EmptyText { .. }));
    assert_eq!(factual.calls() + creative.calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn garbage_bytes_are_a_corrupt_pdf() {
    skip_without_pdfium!();

    let err = extract_text(&PdfSource::from_bytes("junk.pdf", b"not a pdf".to_vec()))
        .await
        .unwrap_err();
    assert!(
        matches!(err, WorkflowError::CorruptPdf { .. }),
        "got: {err}"
    );
}
