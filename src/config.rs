//! Configuration types for the rules-to-variants pipeline.
//!
//! Pipeline behaviour is controlled through [`WorkflowConfig`], built via its
//! [`WorkflowConfigBuilder`]. Storage connection settings live in a separate
//! [`StorageConfig`] handed to [`crate::storage::ObjectStorage::new`].
//!
//! Nothing in this module reads the environment. The binaries read
//! `OLLAMA_HOST`, `MINIO_*` and friends once, through their argument
//! parsers, and pass plain values in.

use crate::error::WorkflowError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "mistral";

/// Local Ollama endpoint used when none is configured.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Bucket that receives published documents.
pub const DEFAULT_BUCKET: &str = "jeux-regles";

/// Sampling settings for one LLM handle.
///
/// A run uses two of these: a low-temperature *factual* configuration for
/// structuring and analysis, and a high-temperature *creative* one for
/// variant generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Sampling temperature, 0.0–1.0.
    pub temperature: f32,
    /// Number of model layers offloaded to the GPU (Ollama `num_gpu`).
    pub gpu_layers: u32,
}

impl LlmConfig {
    pub fn new(temperature: f32, gpu_layers: u32) -> Self {
        Self {
            temperature,
            gpu_layers,
        }
    }

    /// Defaults for the structuring and analysis stages (temperature 0.2).
    pub fn factual() -> Self {
        Self::new(0.2, 1)
    }

    /// Defaults for the variant-generation stage (temperature 0.7).
    pub fn creative() -> Self {
        Self::new(0.7, 1)
    }

    fn validate(&self, label: &str) -> Result<(), WorkflowError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(WorkflowError::InvalidConfig(format!(
                "{label} temperature must be within 0.0–1.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Configuration for a full pipeline run.
///
/// # Example
/// ```rust
/// use rules2variants::WorkflowConfig;
///
/// let config = WorkflowConfig::builder()
///     .temperature_extraction(0.1)
///     .temperature_creation(0.9)
///     .gpu_layers(0)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "mistral");
/// ```
#[derive(Clone)]
pub struct WorkflowConfig {
    /// Settings for the structuring and analysis stages.
    pub factual: LlmConfig,

    /// Settings for the variant-generation stage.
    pub creative: LlmConfig,

    /// Model name passed to the inference service. Default: `mistral`.
    pub model: String,

    /// Base URL of the Ollama service. Default: `http://localhost:11434`.
    pub ollama_host: String,

    /// Remote provider name (`openai`, `anthropic`, `gemini`, …).
    /// When `None`, the local Ollama service is used.
    pub provider_name: Option<String>,

    /// Optional per-stage progress hook.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            factual: LlmConfig::factual(),
            creative: LlmConfig::creative(),
            model: DEFAULT_MODEL.to_string(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            provider_name: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("factual", &self.factual)
            .field("creative", &self.creative)
            .field("model", &self.model)
            .field("ollama_host", &self.ollama_host)
            .field("provider_name", &self.provider_name)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn WorkflowProgressCallback>"),
            )
            .finish()
    }
}

impl WorkflowConfig {
    /// Create a new builder for `WorkflowConfig`.
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn temperature_extraction(mut self, t: f32) -> Self {
        self.config.factual.temperature = t;
        self
    }

    pub fn temperature_creation(mut self, t: f32) -> Self {
        self.config.creative.temperature = t;
        self
    }

    /// Applies to both handles.
    pub fn gpu_layers(mut self, n: u32) -> Self {
        self.config.factual.gpu_layers = n;
        self.config.creative.gpu_layers = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn ollama_host(mut self, host: impl Into<String>) -> Self {
        self.config.ollama_host = host.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// An Ollama host given as bare `host:port` (the form `OLLAMA_HOST`
    /// usually takes) gets an `http://` prefix.
    pub fn build(mut self) -> Result<WorkflowConfig, WorkflowError> {
        let c = &mut self.config;
        c.factual.validate("Extraction")?;
        c.creative.validate("Creation")?;
        if c.model.trim().is_empty() {
            return Err(WorkflowError::InvalidConfig("Model name must not be empty".into()));
        }
        if c.provider_name.is_none() {
            let host = c.ollama_host.trim();
            if host.is_empty() {
                return Err(WorkflowError::InvalidConfig("Ollama host must not be empty".into()));
            }
            if !(host.starts_with("http://") || host.starts_with("https://")) {
                c.ollama_host = format!("http://{host}");
            }
        }
        Ok(self.config)
    }
}

/// Connection settings for the S3-compatible object store.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `host:port` or full URL. Default: `localhost:9000`.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Target bucket. Default: `jeux-regles`.
    pub bucket: String,
    /// Signing region; MinIO accepts anything. Default: `us-east-1`.
    pub region: String,
    /// Use TLS when `endpoint` carries no scheme. Default: false.
    pub secure: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            region: "us-east-1".to_string(),
            secure: false,
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("secure", &self.secure)
            .finish()
    }
}

impl StorageConfig {
    /// Endpoint as a full URL, adding a scheme based on `secure` when missing.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            self.endpoint.trim_end_matches('/').to_string()
        } else {
            let scheme = if self.secure { "https" } else { "http" };
            format!("{scheme}://{}", self.endpoint.trim_end_matches('/'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = WorkflowConfig::default();
        assert_eq!(c.factual, LlmConfig::new(0.2, 1));
        assert_eq!(c.creative, LlmConfig::new(0.7, 1));
        assert_eq!(c.model, "mistral");
        assert!(c.provider_name.is_none());
    }

    #[test]
    fn builder_rejects_out_of_range_temperature() {
        let err = WorkflowConfig::builder()
            .temperature_creation(1.5)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Creation"), "got: {err}");
    }

    #[test]
    fn builder_gpu_layers_applies_to_both_handles() {
        let c = WorkflowConfig::builder().gpu_layers(0).build().unwrap();
        assert_eq!(c.factual.gpu_layers, 0);
        assert_eq!(c.creative.gpu_layers, 0);
    }

    #[test]
    fn builder_adds_scheme_to_bare_host() {
        let c = WorkflowConfig::builder()
            .ollama_host("gpu-box:11434")
            .build()
            .unwrap();
        assert_eq!(c.ollama_host, "http://gpu-box:11434");
    }

    #[test]
    fn builder_rejects_empty_host() {
        let err = WorkflowConfig::builder().ollama_host("  ").build().unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidConfig(_)));
    }

    #[test]
    fn remote_provider_ignores_host_check() {
        let c = WorkflowConfig::builder()
            .provider_name("openai")
            .ollama_host("")
            .build();
        assert!(c.is_ok());
    }

    #[test]
    fn storage_endpoint_url_adds_scheme() {
        let mut s = StorageConfig::default();
        assert_eq!(s.endpoint_url(), "http://localhost:9000");
        s.secure = true;
        assert_eq!(s.endpoint_url(), "https://localhost:9000");
        s.endpoint = "http://minio.local:9000/".into();
        assert_eq!(s.endpoint_url(), "http://minio.local:9000");
    }

    #[test]
    fn storage_debug_redacts_secret() {
        let s = StorageConfig::default();
        let dbg = format!("{s:?}");
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains("secret_key: \"minioadmin\""));
    }
}
