//! System prompt for the summarization backend.
//!
//! Callers can override the default via
//! [`crate::config::SummarizerConfig::system_prompt`]; the constant here is
//! used only when no override is provided.

/// Default system prompt sent ahead of the (truncated) article text.
///
/// Seq2seq checkpoints served behind a chat endpoint ignore it; instruction
/// tuned models need it to stay in abstractive-summary mode.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a news and article summarizer.

Summarize the text provided by the user:
- Write a short abstractive summary of two to four sentences
- Keep the language of the source text
- Keep names, figures and dates exactly as written
- Do not add facts that are not in the text
- The text may be cut off mid-sentence; summarize what is there

Output ONLY the summary, with no heading, preamble or commentary."#;
