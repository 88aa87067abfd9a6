//! CLI binary for rules2variants.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `WorkflowConfig` / `StorageConfig`, runs the pipeline or the batch
//! extractor, and sequences the optional save → DVC/Git → upload steps.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rules2variants::{
    batch_extract_with, default_output_path, finalize, save_markdown, BatchEntry,
    ObjectStorage, PdfSource, PdfiumExtractor, ProgressCallback, Stage, StorageConfig,
    ValidationReport, VersionControl, Workflow, WorkflowConfig, WorkflowError, WorkflowOutput,
    WorkflowProgressCallback,
};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner showing the current stage, with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Workflow");
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.stage_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl WorkflowProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut t) = self.stage_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_prefix(format!("[{}/{}]", stage.number(), Stage::COUNT));
        self.bar.set_message(format!("{}…", stage.label()));
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} [{}/{}] {:<30}  {}  {}",
            green("✓"),
            stage.number(),
            Stage::COUNT,
            stage.label(),
            dim(&format!("{output_len:>6} chars")),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let secs = self.elapsed_secs();
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} [{}/{}] {:<30}  {}  {}",
            red("✗"),
            stage.number(),
            Stage::COUNT,
            stage.label(),
            red(first_line),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.finish_and_clear();
    }

    fn on_workflow_complete(&self, document_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Document assembled ({} chars)",
            green("✔"),
            bold(&document_len.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate variants for one game (writes outputs/catan.md)
  rules2variants bg_rules/Catan.pdf

  # Custom output path and sampling
  rules2variants bg_rules/Catan.pdf -o out/catan.md \
      --temperature-extraction 0.1 --temperature-creation 0.9

  # CPU-only inference
  rules2variants bg_rules/Catan.pdf --num-gpu 0

  # Version the PDF with DVC, commit the Markdown, then upload it
  rules2variants bg_rules/Catan.pdf --dvc --minio

  # Extract the text of every PDF in bg_rules/ to output_rules/*.txt
  rules2variants --extract-only

  # Check the model output and print everything as JSON
  rules2variants bg_rules/Catan.pdf --validate --json > run.json

ENVIRONMENT VARIABLES:
  OLLAMA_HOST                Ollama base URL (default http://localhost:11434)
  RULES2VARIANTS_MODEL       Model name (default mistral)
  RULES2VARIANTS_PROVIDER    Remote provider instead of Ollama (openai, anthropic, gemini, …)
  MINIO_ENDPOINT             Object storage endpoint (default localhost:9000)
  MINIO_ACCESS_KEY           Object storage access key (default minioadmin)
  MINIO_SECRET_KEY           Object storage secret key (default minioadmin)
  MINIO_BUCKET               Target bucket (default jeux-regles)
  PDFIUM_LIB_PATH            Path to an existing libpdfium, skips auto-download
  RUST_LOG                   Log filter, overrides --verbose / --quiet

SETUP:
  1. Start Ollama and pull a model:   ollama pull mistral
  2. Run:                             rules2variants bg_rules/Catan.pdf

  PDFium (~30 MB) is downloaded automatically on first run and cached.
"#;

/// Turn a board-game rules PDF into structured rules, a mechanics analysis
/// and three creative variants.
#[derive(Parser, Debug)]
#[command(
    name = "rules2variants",
    version,
    about = "Generate creative board-game variants from a rules PDF with a local LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Rules PDF to process.
    pdf: Option<PathBuf>,

    /// Output Markdown path. Default: outputs/<game>.md
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only extract text from every PDF in --bg-rules-dir (no LLM calls).
    #[arg(long)]
    extract_only: bool,

    /// Source directory for --extract-only.
    #[arg(long, default_value = rules2variants::batch::DEFAULT_SOURCE_DIR)]
    bg_rules_dir: PathBuf,

    /// Destination directory for --extract-only.
    #[arg(long, default_value = rules2variants::batch::DEFAULT_OUTPUT_DIR)]
    output_rules_dir: PathBuf,

    /// Upload the generated Markdown to object storage.
    #[arg(long)]
    minio: bool,

    /// Track the PDF with DVC and commit the Markdown with Git.
    #[arg(long)]
    dvc: bool,

    /// Temperature for structuring and analysis (0.0–1.0).
    #[arg(long, default_value_t = 0.2)]
    temperature_extraction: f32,

    /// Temperature for variant generation (0.0–1.0).
    #[arg(long, default_value_t = 0.7)]
    temperature_creation: f32,

    /// Model layers offloaded to the GPU (0 = CPU only).
    #[arg(long, default_value_t = 1)]
    num_gpu: u32,

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

    /// Check the model output against the expected formats and report.
    #[arg(long)]
    validate: bool,

    /// Print a JSON summary (all artifacts) on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,

    #[command(flatten)]
    storage: StorageArgs,
}

/// Object-storage connection flags.
#[derive(clap::Args, Debug)]
struct StorageArgs {
    /// Object storage endpoint (host:port or URL).
    #[arg(long = "minio-endpoint", env = "MINIO_ENDPOINT", default_value = "localhost:9000")]
    endpoint: String,

    #[arg(
        long = "minio-access-key",
        env = "MINIO_ACCESS_KEY",
        default_value = "minioadmin",
        hide_env_values = true
    )]
    access_key: String,

    #[arg(
        long = "minio-secret-key",
        env = "MINIO_SECRET_KEY",
        default_value = "minioadmin",
        hide_env_values = true,
        hide_default_value = true
    )]
    secret_key: String,

    /// Target bucket.
    #[arg(
        long = "minio-bucket",
        env = "MINIO_BUCKET",
        default_value = rules2variants::config::DEFAULT_BUCKET
    )]
    bucket: String,

    /// Use HTTPS when the endpoint has no scheme.
    #[arg(long = "minio-secure", env = "MINIO_SECURE")]
    secure: bool,
}

impl From<&StorageArgs> for StorageConfig {
    fn from(a: &StorageArgs) -> Self {
        StorageConfig {
            endpoint: a.endpoint.clone(),
            access_key: a.access_key.clone(),
            secret_key: a.secret_key.clone(),
            bucket: a.bucket.clone(),
            secure: a.secure,
            ..StorageConfig::default()
        }
    }
}

/// `--json` payload.
#[derive(Serialize)]
struct RunSummary<'a> {
    output_path: &'a Path,
    #[serde(flatten)]
    output: &'a WorkflowOutput,
    published: Option<bool>,
    versioned: bool,
    validation: Option<&'a ValidationReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries stage progress, so library INFO logs are hidden
    // while it runs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Batch mode ───────────────────────────────────────────────────────
    if cli.extract_only {
        return run_batch(&cli).await;
    }

    // ── Single-PDF mode ──────────────────────────────────────────────────
    let Some(pdf) = cli.pdf.as_deref() else {
        fail_input("Provide a PDF file or use --extract-only.");
    };
    if !pdf.is_file() {
        fail_input(&format!("File not found: {}", pdf.display()));
    }

    ensure_pdfium(cli.quiet).await?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn WorkflowProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let workflow = Workflow::from_config(&config).context("Invalid LLM configuration")?;

    let output = match workflow.run(&PdfSource::from_path(pdf)).await {
        Ok(output) => output,
        Err(e) if e.is_input_error() => fail_input(&e.to_string()),
        Err(e) => return Err(e).context("Workflow failed"),
    };

    // ── Save → DVC/Git → upload ──────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(pdf));
    save_markdown(&output.document, &output_path)
        .await
        .context("Failed to save Markdown")?;

    let vcs = cli.dvc.then(VersionControl::new);
    let storage = cli
        .minio
        .then(|| ObjectStorage::new(StorageConfig::from(&cli.storage)));
    if vcs.is_some() {
        status(
            &cli,
            &cyan("◆"),
            "Versioning PDF with DVC, committing Markdown with Git…",
        );
    }
    if let Some(ref storage) = storage {
        status(
            &cli,
            &cyan("◆"),
            &format!(
                "Uploading to bucket {} after versioning…",
                storage.bucket_name()
            ),
        );
    }
    let published = finalize(pdf, &output_path, vcs.as_ref(), storage.as_ref())
        .await
        .context("Versioning failed")?;
    if published == Some(false) {
        status(
            &cli,
            &yellow("⚠"),
            "Upload failed, see log above. Local file kept.",
        );
    }

    let validation = cli.validate.then(|| output.validate());
    if let Some(ref report) = validation {
        print_validation(&cli, report);
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        let summary = RunSummary {
            output_path: &output_path,
            output: &output,
            published,
            versioned: cli.dvc,
            validation: validation.as_ref(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  Pipeline complete  →  {}",
            green("✔"),
            bold(&output_path.display().to_string())
        );
    }

    Ok(())
}

/// `--extract-only`: every PDF of `--bg-rules-dir` to a `.txt` file.
async fn run_batch(cli: &Cli) -> Result<()> {
    if !cli.bg_rules_dir.is_dir() {
        fail_input(&format!(
            "Directory not found: {}",
            cli.bg_rules_dir.display()
        ));
    }

    ensure_pdfium(cli.quiet).await?;

    let quiet = cli.quiet || cli.json;
    let report = match batch_extract_with(
        &PdfiumExtractor,
        &cli.bg_rules_dir,
        &cli.output_rules_dir,
        |entry: &BatchEntry| {
            if quiet {
                return;
            }
            match (&entry.output, &entry.error) {
                (Some(out), _) => eprintln!(
                    "  {} {}  →  {}",
                    green("✓"),
                    entry.file,
                    dim(&out.display().to_string())
                ),
                (None, Some(err)) => eprintln!(
                    "  {} {}  {}",
                    red("✗"),
                    entry.file,
                    red(err.lines().next().unwrap_or(err))
                ),
                (None, None) => {}
            }
        },
    )
    .await
    {
        Ok(report) => report,
        Err(e @ WorkflowError::DirectoryNotFound { .. }) => fail_input(&e.to_string()),
        Err(e) => return Err(e).context("Batch extraction failed"),
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        if report.total() == 0 {
            eprintln!(
                "{} No PDF found in {}",
                yellow("⚠"),
                cli.bg_rules_dir.display()
            );
        } else {
            let failed = report.total() - report.succeeded();
            eprintln!(
                "{} {}/{} PDF(s) extracted to {}{}",
                if failed == 0 { green("✔") } else { yellow("⚠") },
                bold(&report.succeeded().to_string()),
                report.total(),
                report.output_dir.display(),
                if failed == 0 {
                    String::new()
                } else {
                    format!(
                        "  ({} failed: {})",
                        red(&failed.to_string()),
                        report.failed_files().join(", ")
                    )
                }
            );
        }
    }
    Ok(())
}

/// Map CLI args to `WorkflowConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<WorkflowConfig> {
    let mut builder = WorkflowConfig::builder()
        .temperature_extraction(cli.temperature_extraction)
        .temperature_creation(cli.temperature_creation)
        .gpu_layers(cli.num_gpu)
        .model(cli.model.clone())
        .ollama_host(cli.ollama_host.clone());

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Download pdfium on first use, with a progress bar unless `quiet`.
async fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    // block_in_place lets the callback borrow `bar` without a 'static bound.
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

fn print_validation(cli: &Cli, report: &ValidationReport) {
    if cli.quiet || cli.json {
        return;
    }
    if report.is_clean() {
        eprintln!("{} Output matches the expected formats", green("✔"));
        return;
    }
    eprintln!(
        "{} {} validation warning(s):",
        yellow("⚠"),
        report.warnings.len()
    );
    for w in &report.warnings {
        eprintln!("    - {}", w);
    }
}

fn status(cli: &Cli, icon: &str, msg: &str) {
    if !cli.quiet && !cli.json {
        eprintln!("{icon} {msg}");
    }
}

/// Input problems (missing file or directory, unreadable PDF) exit with 1.
fn fail_input(msg: &str) -> ! {
    eprintln!("{} {}", red("[Error]"), msg);
    std::process::exit(1);
}
