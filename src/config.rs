//! Configuration for the summarizer service.
//!
//! All deployment knobs live in [`SummarizerConfig`], built via its
//! [`SummarizerConfigBuilder`]. The policy constants that decide *what* gets
//! summarized (input budget, minimum length) are deliberately not part of it;
//! see [`crate::pipeline::summarize`].

use crate::error::SummarizerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the locally fine-tuned checkpoint.
pub const DEFAULT_CUSTOM_MODEL_PATH: &str = "./models/summarizer";

/// Default backend used to serve checkpoints.
pub const DEFAULT_PROVIDER: &str = "ollama";

/// Configuration for the summarizer.
///
/// # Example
/// ```rust
/// use edgequake_summarizer::SummarizerConfig;
///
/// let config = SummarizerConfig::builder()
///     .custom_model_path("/srv/models/my_model")
///     .provider_name("ollama")
///     .max_summary_tokens(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_summary_tokens, 200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Local checkpoint directory behind the "custom model" choice.
    /// Default: [`DEFAULT_CUSTOM_MODEL_PATH`].
    pub custom_model_path: PathBuf,

    /// Backend provider name passed to `edgequake_llm::ProviderFactory`.
    /// Default: [`DEFAULT_PROVIDER`].
    pub provider_name: String,

    /// Maximum tokens the model may generate for one summary. Default: 256.
    pub max_summary_tokens: usize,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Largest accepted upload in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// Sessions idle for longer than this are discarded. Default: 3600 s.
    pub session_idle_timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            custom_model_path: PathBuf::from(DEFAULT_CUSTOM_MODEL_PATH),
            provider_name: DEFAULT_PROVIDER.to_string(),
            max_summary_tokens: 256,
            system_prompt: None,
            max_upload_bytes: 20 * 1024 * 1024,
            session_idle_timeout_secs: 3600,
        }
    }
}

impl SummarizerConfig {
    /// Create a new builder for `SummarizerConfig`.
    pub fn builder() -> SummarizerConfigBuilder {
        SummarizerConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }
}

/// Builder for [`SummarizerConfig`].
#[derive(Debug)]
pub struct SummarizerConfigBuilder {
    config: SummarizerConfig,
}

impl SummarizerConfigBuilder {
    pub fn custom_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.custom_model_path = path.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn max_summary_tokens(mut self, n: usize) -> Self {
        self.config.max_summary_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn session_idle_timeout_secs(mut self, secs: u64) -> Self {
        self.config.session_idle_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummarizerConfig, SummarizerError> {
        let c = &self.config;
        if c.custom_model_path.as_os_str().is_empty() {
            return Err(SummarizerError::InvalidConfig(
                "Custom model path must not be empty".into(),
            ));
        }
        if c.provider_name.trim().is_empty() {
            return Err(SummarizerError::InvalidConfig(
                "Provider name must not be empty".into(),
            ));
        }
        if c.max_summary_tokens == 0 {
            return Err(SummarizerError::InvalidConfig(
                "max_summary_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_upload_bytes < 1024 {
            return Err(SummarizerError::InvalidConfig(format!(
                "max_upload_bytes must be at least 1024, got {}",
                c.max_upload_bytes
            )));
        }
        Ok(self.config)
    }
}
