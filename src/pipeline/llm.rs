//! LLM handles: the [`LlmBackend`] seam and the factory that builds them.
//!
//! A handle is a thin configuration object (endpoint, model, temperature,
//! GPU layers) plus an HTTP client; building one performs no I/O, so the
//! workflow builds two fresh handles per run and never caches them.
//!
//! Two implementations ship with the crate:
//!
//! * [`OllamaBackend`]: the default. Talks to a local Ollama service through
//!   its native `/api/generate` endpoint, which is the only Ollama API that
//!   accepts `num_gpu`.
//! * [`ProviderBackend`]: any remote provider known to `edgequake-llm`
//!   (`openai`, `anthropic`, `gemini`, …). GPU layers do not apply there.
//!
//! No retries: a failed call is returned to the caller as-is.

use crate::config::{LlmConfig, WorkflowConfig};
use crate::error::WorkflowError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Single-shot text completion.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send a filled prompt, return the raw generated text.
    async fn complete(&self, prompt: &str) -> Result<String, WorkflowError>;

    /// Short description for logs, e.g. `ollama:mistral@0.2`.
    fn describe(&self) -> String;
}

/// Build a handle for one temperature / GPU-layer setting.
///
/// Uses the remote provider when `config.provider_name` is set, the local
/// Ollama service otherwise.
pub fn build_llm(
    config: &WorkflowConfig,
    llm: LlmConfig,
) -> Result<Arc<dyn LlmBackend>, WorkflowError> {
    match config.provider_name.as_deref() {
        Some(provider) => {
            debug!(
                "Provider '{}' selected; gpu_layers={} is ignored",
                provider, llm.gpu_layers
            );
            Ok(Arc::new(ProviderBackend::new(
                provider,
                &config.model,
                llm,
            )?))
        }
        None => Ok(Arc::new(OllamaBackend::new(
            &config.ollama_host,
            &config.model,
            llm,
        ))),
    }
}

// ── Ollama ───────────────────────────────────────────────────────────────

/// Handle to a model served by Ollama.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    host: String,
    model: String,
    settings: LlmConfig,
}

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateOptions {
    pub temperature: f32,
    pub num_gpu: u32,
}

/// The subset of the `/api/generate` response we read.
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl OllamaBackend {
    pub fn new(host: &str, model: &str, settings: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            settings,
        }
    }

    pub(crate) fn request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.settings.temperature,
                num_gpu: self.settings.gpu_layers,
            },
        }
    }

    fn error(&self, message: impl Into<String>) -> WorkflowError {
        WorkflowError::Inference {
            stage: self.describe(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn complete(&self, prompt: &str) -> Result<String, WorkflowError> {
        let start = Instant::now();
        let url = format!("{}/api/generate", self.host);

        let response = self
            .client
            .post(&url)
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| self.error(format!("{} unreachable: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.error(format!("HTTP {}: {}", status, body.trim())));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| self.error(format!("malformed response: {}", e)))?;

        debug!(
            "{}: {:?} prompt tokens, {:?} output tokens, {:?}",
            self.describe(),
            body.prompt_eval_count,
            body.eval_count,
            start.elapsed()
        );

        Ok(body.response)
    }

    fn describe(&self) -> String {
        format!("ollama:{}@{}", self.model, self.settings.temperature)
    }
}

// ── edgequake-llm providers ──────────────────────────────────────────────

/// Handle to a remote provider resolved by `edgequake-llm`.
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    provider_name: String,
    model: String,
    settings: LlmConfig,
}

impl ProviderBackend {
    /// Resolve `provider_name` through [`ProviderFactory`], which reads the
    /// matching API key (`OPENAI_API_KEY`, …) from the environment.
    pub fn new(
        provider_name: &str,
        model: &str,
        settings: LlmConfig,
    ) -> Result<Self, WorkflowError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            WorkflowError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::from_provider(
            provider,
            provider_name,
            model,
            settings,
        ))
    }

    /// Wrap an already-constructed provider.
    pub fn from_provider(
        provider: Arc<dyn LLMProvider>,
        provider_name: &str,
        model: &str,
        settings: LlmConfig,
    ) -> Self {
        Self {
            provider,
            provider_name: provider_name.to_string(),
            model: model.to_string(),
            settings,
        }
    }
}

#[async_trait]
impl LlmBackend for ProviderBackend {
    async fn complete(&self, prompt: &str) -> Result<String, WorkflowError> {
        let messages = vec![ChatMessage::user(prompt)];
        let options = CompletionOptions {
            temperature: Some(self.settings.temperature),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| WorkflowError::Inference {
                stage: self.describe(),
                message: format!("{}", e),
            })?;

        debug!(
            "{}: {} prompt tokens, {} output tokens",
            self.describe(),
            response.prompt_tokens,
            response.completion_tokens
        );

        Ok(response.content)
    }

    fn describe(&self) -> String {
        format!(
            "{}:{}@{}",
            self.provider_name, self.model, self.settings.temperature
        )
    }
}
