//! Post-save sequence: DVC/Git versioning first, upload last.

use rules2variants::{finalize, ObjectStorage, StorageConfig, VcsError, VersionControl};
use std::path::Path;

fn unreachable_storage() -> ObjectStorage {
    ObjectStorage::new(StorageConfig {
        // Port 9 (discard) is closed on any sane test machine.
        endpoint: "127.0.0.1:9".into(),
        ..StorageConfig::default()
    })
}

fn saved_document(dir: &Path) -> std::path::PathBuf {
    let doc = dir.join("catan.md");
    std::fs::write(&doc, "# Règles").unwrap();
    doc
}

#[tokio::test]
async fn upload_failure_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let doc = saved_document(dir.path());

    let published = finalize(
        Path::new("bg_rules/catan.pdf"),
        &doc,
        None,
        Some(&unreachable_storage()),
    )
    .await
    .unwrap();
    assert_eq!(published, Some(false));
}

#[tokio::test]
async fn nothing_requested_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let doc = saved_document(dir.path());

    let published = finalize(Path::new("bg_rules/catan.pdf"), &doc, None, None)
        .await
        .unwrap();
    assert_eq!(published, None);
}

#[cfg(unix)]
#[tokio::test]
async fn versioning_failure_is_fatal_even_with_storage() {
    let dir = tempfile::tempdir().unwrap();
    let doc = saved_document(dir.path());
    let vcs = VersionControl::new()
        .workdir(dir.path())
        .dvc_program("false");

    let err = finalize(
        Path::new("bg_rules/catan.pdf"),
        &doc,
        Some(&vcs),
        Some(&unreachable_storage()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, VcsError::CommandFailed { .. }), "got: {err}");
}

#[cfg(unix)]
#[tokio::test]
async fn successful_versioning_without_storage() {
    let dir = tempfile::tempdir().unwrap();
    let doc = saved_document(dir.path());
    let vcs = VersionControl::new()
        .workdir(dir.path())
        .dvc_program("true")
        .git_program("true");

    let published = finalize(Path::new("bg_rules/catan.pdf"), &doc, Some(&vcs), None)
        .await
        .unwrap();
    assert_eq!(published, None);
}
