//! Summarization invoker: length policy, truncation, timing and statistics.
//!
//! ## Policy constants
//!
//! [`MIN_WORDS`] and [`INPUT_CHAR_BUDGET`] are fixed. The minimum is a hard
//! gate: shorter inputs never reach the registry, so no model is loaded for
//! them. The budget is a blunt character cut that can land mid-word; BART
//! checkpoints accept 1024 *tokens*, so 1024 characters always fits.

use crate::error::{InferenceError, SummarizeError};
use crate::pipeline::model::{ModelChoice, ModelHandle};
use crate::pipeline::postprocess::clean_summary;
use crate::pipeline::registry::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Inputs with fewer whitespace-separated words are rejected.
pub const MIN_WORDS: usize = 50;

/// Only the first this-many characters are sent to the model.
pub const INPUT_CHAR_BUDGET: usize = 1024;

/// Outcome of one successful summarization.
///
/// `summary_text` is the model output after [`clean_summary`];
/// `summary_word_count` and `compression_ratio` are computed on that cleaned
/// text, never on the raw output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizationResult {
    pub summary_text: String,
    pub source_word_count: usize,
    pub summary_word_count: usize,
    /// `(1 − summary/source) × 100`; 0 when the source is empty.
    pub compression_ratio: f64,
    pub elapsed_seconds: f64,
    pub model: ModelChoice,
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The first `budget` characters of `text` (Unicode scalar values, not bytes).
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Percentage of words removed by the summary.
///
/// Negative when the summary is longer than the source.
pub fn compression_percent(source_words: usize, summary_words: usize) -> f64 {
    if source_words == 0 {
        return 0.0;
    }
    (1.0 - summary_words as f64 / source_words as f64) * 100.0
}

/// Summarize `text` with the model selected by `choice`.
///
/// Applies the [`MIN_WORDS`] gate before touching the registry, then loads
/// (or reuses) the model and invokes it.
pub async fn summarize(
    registry: &ModelRegistry,
    choice: ModelChoice,
    text: &str,
) -> Result<SummarizationResult, SummarizeError> {
    let source_words = word_count(text);
    if source_words < MIN_WORDS {
        debug!("Rejecting input: {} words", source_words);
        return Err(SummarizeError::TooShort {
            word_count: source_words,
            minimum: MIN_WORDS,
        });
    }

    let handle = registry.get_or_load(choice).await?;
    Ok(invoke(&handle, text).await?)
}

/// Run the pipeline on the truncated text and derive statistics.
///
/// Does not apply the length policy; use [`summarize`] for user input.
pub async fn invoke(handle: &ModelHandle, text: &str) -> Result<SummarizationResult, InferenceError> {
    let source_words = word_count(text);
    let input = truncate_chars(text, INPUT_CHAR_BUDGET);

    let start = Instant::now();
    let raw = handle.pipeline().summarize(input).await?;
    let elapsed = start.elapsed();

    let summary_text = clean_summary(&raw);
    if summary_text.is_empty() {
        return Err(InferenceError::EmptySummary);
    }

    let summary_words = word_count(&summary_text);
    info!(
        "{}: {} → {} words in {:.2}s",
        handle.choice.label(),
        source_words,
        summary_words,
        elapsed.as_secs_f64()
    );

    Ok(SummarizationResult {
        summary_text,
        source_word_count: source_words,
        summary_word_count: summary_words,
        compression_ratio: compression_percent(source_words, summary_words),
        elapsed_seconds: elapsed.as_secs_f64(),
        model: handle.choice,
    })
}
