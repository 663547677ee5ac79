//! CLI binary for edgequake-summarizer.
//!
//! `summarizer serve` starts the chat web UI; `summarizer summarize` runs a
//! single article or PDF through the same pipeline and prints the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edgequake_summarizer::chat::{format_summary, render_outcome, Source};
use edgequake_summarizer::pipeline::extract::check_magic;
use edgequake_summarizer::web::{self, AppState};
use edgequake_summarizer::{
    extract_text, summarize, Device, ModelChoice, ModelRegistry, ProviderLoader, SummarizeError,
    SummarizerConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the chat UI on http://127.0.0.1:8501
  summarizer serve

  # Listen on all interfaces
  summarizer serve --bind 0.0.0.0:8080

  # Summarize an article
  summarizer summarize article.txt --model bart-large-cnn

  # Summarize a PDF, JSON output
  summarizer summarize report.pdf --json

  # Summarize from stdin
  cat article.txt | summarizer summarize -

MODELS:
  custom               Your fine-tuned checkpoint (--custom-model-path)   (default)
  distilbart-cnn-6-6   sshleifer/distilbart-cnn-6-6
  bart-large-cnn       facebook/bart-large-cnn

ENVIRONMENT VARIABLES:
  SUMMARIZER_MODEL_PATH   Custom checkpoint directory
  SUMMARIZER_PROVIDER     Backend provider (ollama, openai, …)
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Overrides the log filter
"#;

/// Summarize articles and PDFs with pretrained summarization models.
#[derive(Parser, Debug)]
#[command(
    name = "summarizer",
    version,
    about = "Summarize articles and PDFs with pretrained summarization models",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory of the custom fine-tuned checkpoint.
    #[arg(long, global = true, env = "SUMMARIZER_MODEL_PATH")]
    custom_model_path: Option<PathBuf>,

    /// Backend provider serving the checkpoints.
    #[arg(long, global = true, env = "SUMMARIZER_PROVIDER")]
    provider: Option<String>,

    /// Max tokens generated per summary.
    #[arg(long, global = true, env = "SUMMARIZER_MAX_TOKENS", default_value_t = 256)]
    max_summary_tokens: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "SUMMARIZER_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SUMMARIZER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SUMMARIZER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the chat web UI.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "SUMMARIZER_BIND", default_value = "127.0.0.1:8501")]
        bind: SocketAddr,

        /// Largest accepted PDF upload, in MiB.
        #[arg(long, env = "SUMMARIZER_MAX_UPLOAD_MB", default_value_t = 20)]
        max_upload_mb: usize,

        /// Drop sessions idle for longer than this many seconds.
        #[arg(long, env = "SUMMARIZER_SESSION_TIMEOUT", default_value_t = 3600)]
        session_timeout: u64,
    },

    /// Summarize one article or PDF and print the result.
    Summarize {
        /// Text or PDF file; `-` reads from stdin.
        input: String,

        /// custom, distilbart-cnn-6-6 or bart-large-cnn.
        #[arg(short, long, default_value = "custom")]
        model: ModelChoice,

        /// Output the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    let config = build_config(&cli).await?;
    let device = Device::detect();
    let registry = Arc::new(ModelRegistry::new(
        Arc::new(ProviderLoader::new(&config)),
        device,
    ));

    match cli.command {
        Command::Serve { bind, .. } => {
            if !cli.quiet {
                eprintln!(
                    "{} Article Summarizer Bot on http://{}  {}",
                    green("◆"),
                    bind,
                    dim(&format!("device: {device}"))
                );
            }
            let state = AppState::new(registry, config);
            web::serve(state, bind).await.context("Server failed")?;
        }
        Command::Summarize {
            ref input,
            model,
            json,
        } => {
            run_summarize(&registry, input, model, json, cli.quiet).await?;
        }
    }

    Ok(())
}

async fn run_summarize(
    registry: &ModelRegistry,
    input: &str,
    model: ModelChoice,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let bytes = read_input(input).await?;
    let file_name = if input == "-" { "stdin" } else { input };

    let spinner = (!quiet).then(|| spinner("Reading input…"));

    let (text, source) = if check_magic(&bytes).is_ok() {
        let text = extract_text(bytes)
            .await
            .with_context(|| format!("Failed to extract text from {file_name}"))?;
        (text, Source::Pdf { file_name })
    } else {
        let text = String::from_utf8(bytes).context("Input is neither a PDF nor UTF-8 text")?;
        (text, Source::Text)
    };

    if let Some(bar) = &spinner {
        bar.set_message(format!("Summarizing with {}…", model.label()));
    }
    let outcome = summarize(registry, model, &text).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let result = match outcome {
        Ok(result) => result,
        Err(e @ SummarizeError::TooShort { .. }) => {
            anyhow::bail!("{}", render_outcome(source, model, &Err(e)))
        }
        Err(e) => return Err(e).context("Summarization failed"),
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if json {
        let out = serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
        writeln!(handle, "{out}").context("Failed to write to stdout")?;
    } else {
        handle
            .write_all(format_summary(&result, source).as_bytes())
            .context("Failed to write to stdout")?;
    }
    Ok(())
}

async fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {input}"))
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Map CLI args to `SummarizerConfig`.
async fn build_config(cli: &Cli) -> Result<SummarizerConfig> {
    let mut builder = SummarizerConfig::builder().max_summary_tokens(cli.max_summary_tokens);

    if let Some(ref path) = cli.custom_model_path {
        builder = builder.custom_model_path(path);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Command::Serve {
        max_upload_mb,
        session_timeout,
        ..
    } = cli.command
    {
        builder = builder
            .max_upload_bytes(max_upload_mb.saturating_mul(1024 * 1024))
            .session_idle_timeout_secs(session_timeout);
    }

    builder.build().context("Invalid configuration")
}
