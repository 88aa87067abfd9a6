//! S3-compatible object storage (MinIO in development).
//!
//! [`ObjectStorage`] exposes two policies over the same calls:
//!
//! | strict                | lenient            |
//! |-----------------------|--------------------|
//! | [`ObjectStorage::upload`]   | [`ObjectStorage::publish`] |
//! | [`ObjectStorage::download`] | [`ObjectStorage::fetch`]   |
//!
//! The lenient methods log every failure at `error` level and report it as
//! `false`; a storage outage never aborts a run.

use crate::config::StorageConfig;
use crate::error::StorageError;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use std::path::Path;
use tracing::{debug, error, info};

/// Key prefix for published variant documents.
pub const PUBLISH_PREFIX: &str = "variantes";

/// Handle to one bucket on an S3-compatible endpoint.
///
/// Construction does no I/O and cannot fail; client errors surface on the
/// first call.
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    config: StorageConfig,
}

impl ObjectStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn bucket_name(&self) -> &str {
        &self.config.bucket
    }

    fn region(&self) -> Region {
        Region::Custom {
            region: self.config.region.clone(),
            endpoint: self.config.endpoint_url(),
        }
    }

    fn credentials(&self) -> Result<Credentials, StorageError> {
        Credentials::new(
            Some(self.config.access_key.as_str()),
            Some(self.config.secret_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(e.to_string()))
    }

    fn bucket(&self) -> Result<Box<Bucket>, StorageError> {
        let bucket = Bucket::new(&self.config.bucket, self.region(), self.credentials()?)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        Ok(bucket.with_path_style())
    }

    /// Create the bucket when it does not exist yet.
    pub async fn ensure_bucket(&self) -> Result<(), StorageError> {
        let bucket = self.bucket()?;
        let name = self.config.bucket.clone();
        let bucket_err = |detail: String| StorageError::Bucket {
            bucket: name.clone(),
            detail,
        };

        let exists = bucket.exists().await.map_err(|e| bucket_err(e.to_string()))?;
        if exists {
            debug!("Bucket '{}' exists", name);
            return Ok(());
        }

        Bucket::create_with_path_style(
            &name,
            self.region(),
            self.credentials()?,
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| bucket_err(e.to_string()))?;
        info!("Created bucket '{}'", name);
        Ok(())
    }

    /// Upload a local file under `key`, creating the bucket if needed.
    pub async fn upload(&self, local_path: &Path, key: &str) -> Result<(), StorageError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|source| StorageError::LocalIo {
                path: local_path.to_path_buf(),
                source,
            })?;
        self.upload_bytes(&bytes, key).await
    }

    /// Upload an in-memory document under `key`, creating the bucket if
    /// needed.
    pub async fn upload_bytes(&self, bytes: &[u8], key: &str) -> Result<(), StorageError> {
        self.ensure_bucket().await?;
        let bucket = self.bucket()?;
        bucket
            .put_object_with_content_type(key, bytes, content_type(key))
            .await
            .map_err(|e| StorageError::Upload {
                bucket: self.config.bucket.clone(),
                key: key.to_string(),
                detail: e.to_string(),
            })?;
        info!(
            "Uploaded {}/{} ({} bytes)",
            self.config.bucket,
            key,
            bytes.len()
        );
        Ok(())
    }

    /// Download `key` to `local_path`, creating parent directories.
    pub async fn download(&self, key: &str, local_path: &Path) -> Result<(), StorageError> {
        let bucket = self.bucket()?;
        let response = bucket
            .get_object(key)
            .await
            .map_err(|e| StorageError::Download {
                bucket: self.config.bucket.clone(),
                key: key.to_string(),
                detail: e.to_string(),
            })?;

        let local_err = |source| StorageError::LocalIo {
            path: local_path.to_path_buf(),
            source,
        };
        if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(local_err)?;
        }
        tokio::fs::write(local_path, response.bytes())
            .await
            .map_err(local_err)?;
        info!(
            "Downloaded {}/{} → {}",
            self.config.bucket,
            key,
            local_path.display()
        );
        Ok(())
    }

    /// [`upload`](Self::upload), logging instead of failing.
    pub async fn publish(&self, local_path: &Path, key: &str) -> bool {
        match self.upload(local_path, key).await {
            Ok(()) => true,
            Err(e) => {
                error!("Upload to object storage failed: {}", e);
                false
            }
        }
    }

    /// [`download`](Self::download), logging instead of failing.
    pub async fn fetch(&self, key: &str, local_path: &Path) -> bool {
        match self.download(key, local_path).await {
            Ok(()) => true,
            Err(e) => {
                error!("Download from object storage failed: {}", e);
                false
            }
        }
    }
}

/// `variantes/<file name>` for a local document path.
pub fn publish_key(local_path: &Path) -> String {
    let name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{PUBLISH_PREFIX}/{name}")
}

fn content_type(key: &str) -> &'static str {
    match Path::new(key).extension().and_then(|e| e.to_str()) {
        Some("md") => "text/markdown; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_key_uses_file_name_only() {
        assert_eq!(
            publish_key(Path::new("outputs/catan.md")),
            "variantes/catan.md"
        );
    }

    #[test]
    fn markdown_content_type() {
        assert_eq!(
            content_type("variantes/a.md"),
            "text/markdown; charset=utf-8"
        );
        assert_eq!(content_type("blob"), "application/octet-stream");
    }

    #[test]
    fn bucket_handle_builds_without_io() {
        let storage = ObjectStorage::new(StorageConfig::default());
        assert!(storage.bucket().is_ok());
        assert_eq!(storage.bucket_name(), "jeux-regles");
    }

    #[tokio::test]
    async fn missing_local_file_is_a_local_io_error() {
        let storage = ObjectStorage::new(StorageConfig::default());
        let err = storage
            .upload(Path::new("/no/such/doc.md"), "variantes/doc.md")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::LocalIo { .. }));
    }
}
