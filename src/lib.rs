//! # edgequake-summarizer
//!
//! Chat-style summarizer for news articles and PDF documents.
//!
//! A user pastes an article or uploads a PDF; the text is summarized by one
//! of three pretrained abstractive models and the summary is appended to the
//! session's transcript together with word counts, compression and timing.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text ─────────────────────────┐
//!                               ├─ 2. Gate       reject < 50 words
//! PDF ── 1. Extract (pdfium) ───┘   3. Load      registry: once per model
//!                                   4. Invoke    first 1024 chars, greedy
//!                                   5. Polish    output cleanup
//!                                   6. Format    summary + statistics
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use edgequake_summarizer::{
//!     summarize, Device, ModelChoice, ModelRegistry, ProviderLoader, SummarizerConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SummarizerConfig::default();
//!     let registry = ModelRegistry::new(Arc::new(ProviderLoader::new(&config)), Device::detect());
//!
//!     let article = std::fs::read_to_string("article.txt")?;
//!     let result = summarize(&registry, ModelChoice::BartLargeCnn, &article).await?;
//!     println!("{}", result.summary_text);
//!     eprintln!("compression: {:.1}%", result.compression_ratio);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `summarizer` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-summarizer = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing a Model
//!
//! | Choice | Checkpoint | Notes |
//! |--------|------------|-------|
//! | `custom` | local directory | Default; your fine-tuned weights |
//! | `distilbart-cnn-6-6` | `sshleifer/distilbart-cnn-6-6` | Fastest |
//! | `bart-large-cnn` | `facebook/bart-large-cnn` | Best quality on news |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod chat;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod session;
pub mod transcript;
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SummarizerConfig, SummarizerConfigBuilder};
pub use error::{ExtractionError, InferenceError, LoadError, SummarizeError, SummarizerError};
pub use pipeline::extract::extract_text;
pub use pipeline::model::{
    BackendConnector, ChatBackend, ChatReply, Device, ModelChoice, ModelHandle, PipelineLoader,
    ProviderConnector, ProviderLoader, SummarizationPipeline,
};
pub use pipeline::registry::{LoadStatus, ModelRegistry};
pub use pipeline::summarize::{summarize, SummarizationResult, INPUT_CHAR_BUDGET, MIN_WORDS};
pub use session::{Session, SessionStore};
pub use transcript::{Message, Role, Transcript};
pub use web::{router, AppState};
