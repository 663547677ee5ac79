//! Model selection, device detection and the pipeline seams.
//!
//! A *pipeline* binds one checkpoint and a deterministic decoding strategy
//! into a single callable unit ([`SummarizationPipeline`]). Pipelines are
//! produced by a [`PipelineLoader`]; the production loader,
//! [`ProviderLoader`], resolves the checkpoint and materialises an
//! `edgequake-llm` provider that serves it. Tests plug in their own loader.

use crate::config::SummarizerConfig;
use crate::error::{InferenceError, LoadError};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// The models a user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelChoice {
    /// The locally fine-tuned checkpoint at
    /// [`SummarizerConfig::custom_model_path`]. (default)
    #[default]
    Custom,
    /// `sshleifer/distilbart-cnn-6-6`
    DistilBartCnn,
    /// `facebook/bart-large-cnn`
    BartLargeCnn,
}

impl ModelChoice {
    /// Every choice, in selector order.
    pub const ALL: [ModelChoice; 3] = [
        ModelChoice::Custom,
        ModelChoice::DistilBartCnn,
        ModelChoice::BartLargeCnn,
    ];

    /// Stable identifier used in forms and on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            ModelChoice::Custom => "custom",
            ModelChoice::DistilBartCnn => "distilbart-cnn-6-6",
            ModelChoice::BartLargeCnn => "bart-large-cnn",
        }
    }

    /// Human-readable name shown in the UI and in summary statistics.
    pub fn label(self) -> &'static str {
        match self {
            ModelChoice::Custom => "Your custom model",
            ModelChoice::DistilBartCnn => "distilbart-cnn-6-6",
            ModelChoice::BartLargeCnn => "facebook/bart-large-cnn",
        }
    }

    /// Pretrained checkpoint name, `None` for the custom local path.
    pub fn checkpoint(self) -> Option<&'static str> {
        match self {
            ModelChoice::Custom => None,
            ModelChoice::DistilBartCnn => Some("sshleifer/distilbart-cnn-6-6"),
            ModelChoice::BartLargeCnn => Some("facebook/bart-large-cnn"),
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ModelChoice::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s) || c.checkpoint() == Some(s))
            .ok_or_else(|| {
                format!(
                    "unknown model '{s}' (expected one of: {})",
                    ModelChoice::ALL.map(ModelChoice::slug).join(", ")
                )
            })
    }
}

/// Compute device a pipeline is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    /// CUDA device by index.
    Cuda(u32),
    Cpu,
}

impl Device {
    /// GPU 0 if an NVIDIA runtime is visible, else CPU.
    pub fn detect() -> Self {
        let hidden = std::env::var("CUDA_VISIBLE_DEVICES")
            .map(|v| {
                let v = v.trim();
                v.is_empty() || v == "-1" || v.eq_ignore_ascii_case("NoDevFiles")
            })
            .unwrap_or(false);
        let driver = Path::new("/proc/driver/nvidia/version").exists()
            || Path::new("/dev/nvidia0").exists();

        let device = if driver && !hidden {
            Device::Cuda(0)
        } else {
            Device::Cpu
        };
        debug!("Detected compute device: {}", device);
        device
    }

    pub fn is_gpu(self) -> bool {
        matches!(self, Device::Cuda(_))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda(idx) => write!(f, "CUDA:{idx}"),
            Device::Cpu => f.write_str("CPU"),
        }
    }
}

/// A loaded summarization model with a fixed decoding strategy.
///
/// Implementations must decode deterministically: the same input on the same
/// pipeline yields the same summary.
pub trait SummarizationPipeline: Send + Sync {
    /// Summarize `text`, returning the raw model output.
    fn summarize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, InferenceError>>;
}

/// Resolves a [`ModelChoice`] into a runnable pipeline.
///
/// Called at most once per choice by [`crate::pipeline::registry::ModelRegistry`].
pub trait PipelineLoader: Send + Sync {
    fn load(
        &self,
        choice: ModelChoice,
        device: Device,
    ) -> BoxFuture<'_, Result<Arc<dyn SummarizationPipeline>, LoadError>>;
}

/// Opaque handle to a loaded pipeline, bound to one model and one device.
#[derive(Clone)]
pub struct ModelHandle {
    pub choice: ModelChoice,
    pub device: Device,
    pipeline: Arc<dyn SummarizationPipeline>,
}

impl ModelHandle {
    pub fn new(choice: ModelChoice, device: Device, pipeline: Arc<dyn SummarizationPipeline>) -> Self {
        Self {
            choice,
            device,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &Arc<dyn SummarizationPipeline> {
        &self.pipeline
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("choice", &self.choice)
            .field("device", &self.device)
            .field("pipeline", &"<dyn SummarizationPipeline>")
            .finish()
    }
}

// ── Production loader ────────────────────────────────────────────────────

/// Reply of one chat-completion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// The part of a chat-completion provider a pipeline needs: one system
/// message, one user message, fixed options.
pub trait ChatBackend: Send + Sync {
    fn chat<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        options: &'a CompletionOptions,
    ) -> BoxFuture<'a, Result<ChatReply, String>>;
}

/// Opens a [`ChatBackend`] for one model on one provider.
pub trait BackendConnector: Send + Sync {
    fn connect(&self, provider: &str, model: &str) -> Result<Arc<dyn ChatBackend>, String>;
}

/// Connects through `edgequake_llm::ProviderFactory`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderConnector;

impl BackendConnector for ProviderConnector {
    fn connect(&self, provider: &str, model: &str) -> Result<Arc<dyn ChatBackend>, String> {
        let provider =
            ProviderFactory::create_llm_provider(provider, model).map_err(|e| format!("{e}"))?;
        Ok(Arc::new(ProviderBackend { provider }))
    }
}

struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
}

impl ChatBackend for ProviderBackend {
    fn chat<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        options: &'a CompletionOptions,
    ) -> BoxFuture<'a, Result<ChatReply, String>> {
        async move {
            let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
            let response = self
                .provider
                .chat(&messages, Some(options))
                .await
                .map_err(|e| format!("{e}"))?;
            Ok(ChatReply {
                content: response.content,
                prompt_tokens: response.prompt_tokens,
                completion_tokens: response.completion_tokens,
            })
        }
        .boxed()
    }
}

/// Text sent once per load to prove the backend serves the model.
const WARM_UP_TEXT: &str = "Reply with OK.";

/// Loads checkpoints through an `edgequake-llm` provider.
///
/// Pretrained checkpoints are requested by their hub name; the custom choice
/// is requested by the canonical path of its checkpoint directory, which is
/// how OpenAI-compatible servers (vLLM, TGI) expose locally loaded weights.
///
/// Building a provider client does not contact the backend, so every load
/// ends with a one-token warm-up call. A backend that is down or does not
/// serve the checkpoint fails the load with [`LoadError::Provider`] and
/// nothing is cached.
pub struct ProviderLoader {
    provider_name: String,
    custom_model_path: PathBuf,
    options: CompletionOptions,
    system_prompt: String,
    connector: Arc<dyn BackendConnector>,
}

impl ProviderLoader {
    pub fn new(config: &SummarizerConfig) -> Self {
        Self::with_connector(config, Arc::new(ProviderConnector))
    }

    /// Like [`new`](Self::new) with a custom way of reaching the backend.
    pub fn with_connector(config: &SummarizerConfig, connector: Arc<dyn BackendConnector>) -> Self {
        Self {
            provider_name: config.provider_name.clone(),
            custom_model_path: config.custom_model_path.clone(),
            options: build_options(config),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            connector,
        }
    }

    /// The model reference handed to the provider for `choice`.
    fn model_ref(&self, choice: ModelChoice) -> Result<String, LoadError> {
        match choice.checkpoint() {
            Some(name) => Ok(name.to_string()),
            None => resolve_checkpoint_dir(&self.custom_model_path)
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }

    fn provider_error(&self, model: &str, detail: String) -> LoadError {
        LoadError::Provider {
            provider: self.provider_name.clone(),
            model: model.to_string(),
            detail,
        }
    }
}

impl PipelineLoader for ProviderLoader {
    fn load(
        &self,
        choice: ModelChoice,
        device: Device,
    ) -> BoxFuture<'_, Result<Arc<dyn SummarizationPipeline>, LoadError>> {
        async move {
            let model = self.model_ref(choice)?;
            info!(
                "Loading '{}' via provider '{}' on {}",
                model, self.provider_name, device
            );

            let backend = self
                .connector
                .connect(&self.provider_name, &model)
                .map_err(|detail| self.provider_error(&model, detail))?;

            let warm_up = CompletionOptions {
                max_tokens: Some(1),
                ..self.options.clone()
            };
            backend
                .chat(&self.system_prompt, WARM_UP_TEXT, &warm_up)
                .await
                .map_err(|detail| self.provider_error(&model, detail))?;
            debug!("Warm-up call for '{}' succeeded", model);

            let pipeline: Arc<dyn SummarizationPipeline> = Arc::new(LlmPipeline {
                backend,
                model,
                options: self.options.clone(),
                system_prompt: self.system_prompt.clone(),
            });
            Ok(pipeline)
        }
        .boxed()
    }
}

/// Check that `path` is a checkpoint directory (it must hold a `config.json`).
pub fn resolve_checkpoint_dir(path: &Path) -> Result<PathBuf, LoadError> {
    if !path.exists() {
        return Err(LoadError::PathNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() || !path.join("config.json").is_file() {
        return Err(LoadError::NotACheckpoint {
            path: path.to_path_buf(),
        });
    }
    path.canonicalize().map_err(|_| LoadError::PathNotFound {
        path: path.to_path_buf(),
    })
}

/// Deterministic decoding: temperature 0, bounded output.
fn build_options(config: &SummarizerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(0.0),
        max_tokens: Some(config.max_summary_tokens),
        ..Default::default()
    }
}

/// A pipeline backed by a chat-completion provider.
struct LlmPipeline {
    backend: Arc<dyn ChatBackend>,
    model: String,
    options: CompletionOptions,
    system_prompt: String,
}

impl SummarizationPipeline for LlmPipeline {
    fn summarize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, InferenceError>> {
        async move {
            let reply = self
                .backend
                .chat(&self.system_prompt, text, &self.options)
                .await
                .map_err(InferenceError::Provider)?;

            debug!(
                "{}: {} input tokens, {} output tokens",
                self.model, reply.prompt_tokens, reply.completion_tokens
            );
            Ok(reply.content)
        }
        .boxed()
    }
}
