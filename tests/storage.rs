//! Object storage against an endpoint nobody listens on.

use rules2variants::{ObjectStorage, StorageConfig, StorageError};
use std::time::Duration;

fn unreachable_storage() -> ObjectStorage {
    ObjectStorage::new(StorageConfig {
        // Port 9 (discard) is closed on any sane test machine.
        endpoint: "127.0.0.1:9".into(),
        ..StorageConfig::default()
    })
}

#[tokio::test]
async fn publish_to_unreachable_endpoint_returns_false() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("catan.md");
    std::fs::write(&doc, "# Règles").unwrap();

    let ok = tokio::time::timeout(
        Duration::from_secs(60),
        unreachable_storage().publish(&doc, "variantes/catan.md"),
    )
    .await
    .expect("publish must not hang");
    assert!(!ok);
}

#[tokio::test]
async fn strict_upload_surfaces_a_bucket_error() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("catan.md");
    std::fs::write(&doc, "# Règles").unwrap();

    let err = unreachable_storage()
        .upload(&doc, "variantes/catan.md")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Bucket { .. }), "got: {err}");
}

#[tokio::test]
async fn fetch_from_unreachable_endpoint_returns_false() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested/catan.md");
    assert!(
        !unreachable_storage()
            .fetch("variantes/catan.md", &target)
            .await
    );
    assert!(!target.exists());
}
