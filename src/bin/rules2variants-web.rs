//! Web UI for rules2variants.
//!
//! Serves a single HTML page and a JSON API:
//!
//! * `GET  /`         upload form
//! * `POST /api/run`  multipart: `file` (PDF), `temperature_extraction`,
//!   `temperature_creation`, `num_gpu`, `publish`, `validate`
//! * `GET  /health`
//!
//! Every request builds its own workflow; a failed run is reported as JSON
//! and the server keeps serving.

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use rules2variants::{
    game_slug, ObjectStorage, PdfSource, StorageConfig, ValidationReport, Workflow,
    WorkflowConfig, WorkflowError, WorkflowOutput,
};
use serde::Serialize;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Uploads larger than this are rejected.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Web UI for generating board-game variants from a rules PDF.
#[derive(Parser, Debug)]
#[command(name = "rules2variants-web", version)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "RULES2VARIANTS_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Model name.
    #[arg(
        long,
        env = "RULES2VARIANTS_MODEL",
        default_value = rules2variants::config::DEFAULT_MODEL
    )]
    model: String,

    /// Ollama base URL.
    #[arg(long, env = "OLLAMA_HOST", default_value = rules2variants::config::DEFAULT_OLLAMA_HOST)]
    ollama_host: String,

    /// Use a remote provider (openai, anthropic, gemini, …) instead of Ollama.
    #[arg(long, env = "RULES2VARIANTS_PROVIDER")]
    provider: Option<String>,

    #[arg(long = "minio-endpoint", env = "MINIO_ENDPOINT", default_value = "localhost:9000")]
    storage_endpoint: String,

    #[arg(
        long = "minio-access-key",
        env = "MINIO_ACCESS_KEY",
        default_value = "minioadmin",
        hide_env_values = true
    )]
    storage_access_key: String,

    #[arg(
        long = "minio-secret-key",
        env = "MINIO_SECRET_KEY",
        default_value = "minioadmin",
        hide_env_values = true,
        hide_default_value = true
    )]
    storage_secret_key: String,

    #[arg(
        long = "minio-bucket",
        env = "MINIO_BUCKET",
        default_value = rules2variants::config::DEFAULT_BUCKET
    )]
    storage_bucket: String,
}

struct AppState {
    model: String,
    ollama_host: String,
    provider: Option<String>,
    storage: ObjectStorage,
}

// ── Request / response types ─────────────────────────────────────────────

/// Parsed `POST /api/run` form.
struct RunForm {
    file_name: String,
    bytes: Vec<u8>,
    temperature_extraction: f32,
    temperature_creation: f32,
    num_gpu: u32,
    publish: bool,
    validate: bool,
}

#[derive(Serialize)]
struct RunResponse {
    #[serde(flatten)]
    output: WorkflowOutput,
    /// Suggested file name for the download.
    download_name: String,
    /// `None` when publishing was not requested.
    published: Option<bool>,
    validation: Option<ValidationReport>,
}

/// JSON `{ "error": … }` with a status code.
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        let status = match &e {
            e if e.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::InvalidConfig(_) | WorkflowError::ProviderNotConfigured { .. } => {
                StatusCode::BAD_REQUEST
            }
            WorkflowError::Inference { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, e.to_string())
    }
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    ApiError(StatusCode::BAD_REQUEST, msg.into())
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn run(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<RunResponse>, ApiError> {
    let form = read_form(multipart).await?;
    let slug = game_slug(&form.file_name);
    info!("Received {} ({} bytes)", form.file_name, form.bytes.len());

    let mut builder = WorkflowConfig::builder()
        .temperature_extraction(form.temperature_extraction)
        .temperature_creation(form.temperature_creation)
        .gpu_layers(form.num_gpu)
        .model(state.model.clone())
        .ollama_host(state.ollama_host.clone());
    if let Some(ref provider) = state.provider {
        builder = builder.provider_name(provider.clone());
    }
    let config = builder.build()?;

    let workflow = Workflow::from_config(&config)?;
    let output = workflow
        .run(&PdfSource::from_bytes(form.file_name, form.bytes))
        .await
        .inspect_err(|e| warn!("Run failed: {}", e))?;

    let published = if form.publish {
        Some(publish(&state.storage, &output.document, &slug).await)
    } else {
        None
    };
    let validation = form.validate.then(|| output.validate());

    Ok(Json(RunResponse {
        download_name: format!("variantes_{slug}.md"),
        output,
        published,
        validation,
    }))
}

/// Write the document to a temp file and publish it as `variantes/<slug>.md`.
async fn publish(storage: &ObjectStorage, document: &str, slug: &str) -> bool {
    let tmp = tempfile::Builder::new()
        .suffix(".md")
        .tempfile()
        .and_then(|mut f| f.write_all(document.as_bytes()).map(|_| f));
    match tmp {
        Ok(file) => {
            storage
                .publish(file.path(), &format!("variantes/{slug}.md"))
                .await
        }
        Err(e) => {
            error!("Could not stage document for upload: {}", e);
            false
        }
    }
}

async fn read_form(mut multipart: Multipart) -> Result<RunForm, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut form = RunForm {
        file_name: String::new(),
        bytes: Vec::new(),
        temperature_extraction: 0.2,
        temperature_creation: 0.7,
        num_gpu: 1,
        publish: false,
        validate: false,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Malformed upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Could not read upload: {e}")))?;
            upload = Some((file_name, bytes.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| bad_request(format!("Could not read field '{name}': {e}")))?;
        let value = value.trim();
        match name.as_str() {
            "temperature_extraction" => form.temperature_extraction = parse_field(&name, value)?,
            "temperature_creation" => form.temperature_creation = parse_field(&name, value)?,
            "num_gpu" => form.num_gpu = parse_field(&name, value)?,
            "publish" => form.publish = is_checked(value),
            "validate" => form.validate = is_checked(value),
            _ => {}
        }
    }

    let (file_name, bytes) = upload.ok_or_else(|| bad_request("Missing 'file' field"))?;
    if bytes.is_empty() {
        return Err(bad_request("Uploaded file is empty"));
    }
    form.file_name = file_name;
    form.bytes = bytes;
    Ok(form)
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| bad_request(format!("Invalid value for '{name}': '{value}'")))
}

fn is_checked(value: &str) -> bool {
    matches!(value, "true" | "on" | "1" | "yes")
}

// ── Main ─────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rules2variants=info,tower_http=info")),
        )
        .init();

    if !pdfium_auto::is_pdfium_cached() {
        info!("Downloading PDFium engine…");
        tokio::task::spawn_blocking(|| pdfium_auto::ensure_pdfium_library(None))
            .await
            .context("PDFium download task failed")?
            .context("Failed to download PDFium engine")?;
    }

    let storage = ObjectStorage::new(StorageConfig {
        endpoint: cli.storage_endpoint,
        access_key: cli.storage_access_key,
        secret_key: cli.storage_secret_key,
        bucket: cli.storage_bucket,
        ..StorageConfig::default()
    });

    let state = Arc::new(AppState {
        model: cli.model,
        ollama_host: cli.ollama_host,
        provider: cli.provider,
        storage,
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/run", post(run))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    info!("Listening on http://{}", cli.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="fr">
<head>
<meta charset="utf-8">
<title>Générateur de variantes de jeux de société</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }
  fieldset { margin-bottom: 1rem; }
  label { display: block; margin: .4rem 0; }
  nav button { margin-right: .3rem; }
  pre { white-space: pre-wrap; background: #f6f6f6; padding: 1rem; border-radius: 4px; }
  .error { color: #b00020; }
</style>
</head>
<body>
<h1>Générateur de variantes de jeux de société</h1>
<form id="run">
  <fieldset>
    <legend>Configuration LLM</legend>
    <label>Température extraction (factuel)
      <input type="number" name="temperature_extraction" min="0" max="1" step="0.05" value="0.2"></label>
    <label>Température génération (créatif)
      <input type="number" name="temperature_creation" min="0" max="1" step="0.05" value="0.7"></label>
    <label>Couches GPU (num_gpu)
      <input type="number" name="num_gpu" min="0" max="1" value="1"></label>
    <label><input type="checkbox" name="publish" value="true"> Publier après génération</label>
    <label><input type="checkbox" name="validate" value="true"> Vérifier le format des réponses</label>
  </fieldset>
  <input type="file" name="file" accept="application/pdf,.pdf" required>
  <button type="submit">Lancer le pipeline</button>
</form>
<p id="status"></p>
<nav id="tabs" hidden>
  <button data-key="structured_rules">Règles structurées</button>
  <button data-key="analysis">Analyse</button>
  <button data-key="variants">Variantes</button>
  <button data-key="document">Document complet</button>
  <a id="download">Télécharger le Markdown</a>
</nav>
<pre id="view"></pre>
<script>
const form = document.getElementById('run');
const status = document.getElementById('status');
const view = document.getElementById('view');
const tabs = document.getElementById('tabs');
let result = null;
tabs.addEventListener('click', (e) => {
  if (e.target.dataset.key && result) view.textContent = result[e.target.dataset.key];
});
form.addEventListener('submit', async (e) => {
  e.preventDefault();
  status.className = ''; status.textContent = 'Pipeline en cours…';
  tabs.hidden = true; view.textContent = '';
  const res = await fetch('/api/run', { method: 'POST', body: new FormData(form) });
  const body = await res.json();
  if (!res.ok) { status.className = 'error'; status.textContent = body.error; return; }
  result = body;
  let msg = 'Terminé.';
  if (body.published === true) msg += ' Fichier publié.';
  if (body.published === false) msg += ' Échec de la publication.';
  if (body.validation && body.validation.warnings.length) msg += ' Avertissements : ' + body.validation.warnings.join(' ; ');
  status.textContent = msg;
  const link = document.getElementById('download');
  link.href = URL.createObjectURL(new Blob([body.document], { type: 'text/markdown' }));
  link.download = body.download_name;
  tabs.hidden = false; view.textContent = body.structured_rules;
});
</script>
</body>
</html>
"#;
