use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use abstractor_core::config_file::{self, ConfigFile};
use abstractor_core::{MissingFieldPolicy, OpenAiClient, RunConfig};
use abstractor_pdf_mupdf::MupdfBackend;
use abstractor_reporting::{ExportFormat, export_records};
use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

mod output;

use output::ColorMode;

const DEFAULT_OUTPUT_STEM: &str = "summarized-pdfs";

/// Summarize a directory of research-article PDFs into a spreadsheet
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the platform and local config files
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory containing the PDF articles
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Path of the output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: xlsx, csv or json
    #[arg(long)]
    format: Option<String>,

    /// Chat-completion model name
    #[arg(long)]
    model: Option<String>,

    /// Abort the whole run when a response lacks a field
    #[arg(long)]
    strict: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

/// Fully resolved run settings: CLI flags > env vars > config file > defaults.
struct Settings {
    run: RunConfig,
    api_key: String,
    model: String,
    base_url: Option<String>,
    timeout: Option<Duration>,
    output: PathBuf,
    format: ExportFormat,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("run", &self.run)
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("output", &self.output)
            .field("format", &self.format)
            .finish()
    }
}

fn resolve_settings(
    cli: &Cli,
    file: ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let api = file.api.unwrap_or_default();
    let input = file.input.unwrap_or_default();
    let out = file.output.unwrap_or_default();
    let review = file.review.unwrap_or_default();

    let api_key = env("OPENAI_API_KEY")
        .or(api.key)
        .filter(|k| !k.is_empty())
        .context("no API key: set OPENAI_API_KEY or [api] key in the config file")?;

    let input_dir = cli
        .input_dir
        .clone()
        .or_else(|| env("ABSTRACTOR_INPUT_DIR").map(PathBuf::from))
        .or_else(|| input.directory.map(PathBuf::from))
        .context(
            "no input directory: pass --input-dir, set ABSTRACTOR_INPUT_DIR, \
             or set [input] directory in the config file",
        )?;

    let model = cli
        .model
        .clone()
        .or_else(|| env("ABSTRACTOR_MODEL"))
        .or(api.model)
        .unwrap_or_else(|| abstractor_core::llm::openai::DEFAULT_MODEL.to_string());

    let output_path = cli.output.clone().or_else(|| out.path.map(PathBuf::from));
    let format = match cli.format.as_deref().or(out.format.as_deref()) {
        Some(name) => name.parse()?,
        None => output_path
            .as_deref()
            .map(ExportFormat::from_path)
            .unwrap_or_default(),
    };
    let output = output_path
        .unwrap_or_else(|| PathBuf::from(format!("{DEFAULT_OUTPUT_STEM}.{}", format.extension())));

    let policy = if cli.strict || review.strict.unwrap_or(false) {
        MissingFieldPolicy::Strict
    } else {
        MissingFieldPolicy::Lenient
    };
    let mut run = RunConfig::new(input_dir).with_missing_fields(policy);
    if let Some(topic) = review.topic {
        run = run.with_topic(topic);
    }

    Ok(Settings {
        run,
        api_key,
        model,
        base_url: api.base_url,
        timeout: api.timeout_secs.map(Duration::from_secs),
        output,
        format,
    })
}

fn load_config_file(cli: &Cli) -> anyhow::Result<ConfigFile> {
    match &cli.config {
        Some(path) => Ok(config_file::read_config(path)?),
        None => Ok(config_file::load_config()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli, load_config_file(&cli)?, |k| std::env::var(k).ok())?;
    tracing::debug!(?settings, "resolved settings");

    run(settings, ColorMode(!cli.no_color && std::io::stdout().is_terminal())).await
}

async fn run(settings: Settings, color: ColorMode) -> anyhow::Result<()> {
    let mut client = OpenAiClient::new(settings.api_key)
        .with_model(settings.model)
        .with_timeout(settings.timeout);
    if let Some(url) = settings.base_url {
        client = client.with_base_url(url);
    }
    let backend = MupdfBackend::new();

    let stdout = Mutex::new(std::io::stdout());
    let progress_cb = |event: abstractor_core::ProgressEvent| {
        if let Ok(mut w) = stdout.lock() {
            let _ = output::print_progress(&mut *w, &event, color);
            let _ = w.flush();
        }
    };

    let cancel = CancellationToken::new();

    // Set up Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let outcome =
        abstractor_core::summarize_directory(&settings.run, &backend, &client, progress_cb, cancel)
            .await?;

    write_output(&outcome.records, settings.format, &settings.output)?;

    let mut writer = std::io::stdout();
    output::print_written(&mut writer, &settings.output, color)?;
    output::print_summary(&mut writer, &outcome.records, &outcome.stats, color)?;
    Ok(())
}

fn write_output(
    records: &[abstractor_core::ArticleRecord],
    format: ExportFormat,
    path: &Path,
) -> anyhow::Result<()> {
    export_records(records, format, path)
        .with_context(|| format!("failed to write {}", path.display()))
}
