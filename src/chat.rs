//! Chat actions: one function per user action, session in, session out.
//!
//! Every action appends exactly one user message and one assistant message.
//! Failures never escape: extraction, load, inference and policy errors are
//! all rendered into the assistant message, so the caller always gets a
//! session back.

use crate::error::{ExtractionError, SummarizeError};
use crate::pipeline::extract::{extract_text, validate_upload};
use crate::pipeline::model::ModelChoice;
use crate::pipeline::registry::ModelRegistry;
use crate::pipeline::summarize::{summarize, SummarizationResult};
use crate::session::Session;
use crate::transcript::Message;
use tracing::{info, warn};

/// Prefix of the user message recorded for an uploaded PDF.
pub const PDF_MESSAGE_PREFIX: &str = "📄 PDF: ";

/// Where the summarized text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    Text,
    Pdf { file_name: &'a str },
}

impl Source<'_> {
    fn noun(self) -> &'static str {
        match self {
            Source::Text => "Article",
            Source::Pdf { .. } => "Document",
        }
    }
}

/// Summarize pasted text.
pub async fn submit_text(mut session: Session, registry: &ModelRegistry, input: &str) -> Session {
    session.transcript.append(Message::user(input));

    let outcome = summarize(registry, session.model, input).await;
    let reply = render_outcome(Source::Text, session.model, &outcome);
    session.transcript.append(Message::assistant(reply));
    session
}

/// Extract and summarize an uploaded PDF.
///
/// `upload` is the raw payload, or the error hit while receiving it.
pub async fn submit_pdf(
    mut session: Session,
    registry: &ModelRegistry,
    file_name: &str,
    upload: Result<Vec<u8>, ExtractionError>,
) -> Session {
    let source = Source::Pdf { file_name };
    info!("PDF upload: {}", file_name);

    let extracted = match upload.and_then(|bytes| validate_upload(file_name, &bytes).map(|_| bytes))
    {
        Ok(bytes) => extract_text(bytes).await,
        Err(e) => Err(e),
    };

    let reply = match extracted {
        Ok(text) => {
            session.transcript.append(Message::user(format!(
                "{PDF_MESSAGE_PREFIX}{file_name}\n\n{text}"
            )));
            let outcome = summarize(registry, session.model, &text).await;
            render_outcome(source, session.model, &outcome)
        }
        Err(e) => {
            warn!("Extraction failed for {}: {}", file_name, e);
            session
                .transcript
                .append(Message::user(format!("{PDF_MESSAGE_PREFIX}{file_name}")));
            render_extraction_error(&e)
        }
    };

    session.transcript.append(Message::assistant(reply));
    session
}

/// Clear the transcript. The model selection survives.
pub fn reset(mut session: Session) -> Session {
    session.transcript.reset();
    session
}

pub fn select_model(mut session: Session, choice: ModelChoice) -> Session {
    session.model = choice;
    session
}

/// Render a summarization outcome as the assistant's Markdown reply.
pub fn render_outcome(
    source: Source<'_>,
    model: ModelChoice,
    outcome: &Result<SummarizationResult, SummarizeError>,
) -> String {
    match outcome {
        Ok(result) => format_summary(result, source),
        Err(SummarizeError::TooShort {
            word_count,
            minimum,
        }) => match source {
            Source::Text => format!(
                "⚠️ The article is too short ({word_count} words). \
                 Please send an article with at least {minimum} words."
            ),
            Source::Pdf { .. } => format!(
                "⚠️ The PDF content is too short ({word_count} words). \
                 Please send a document with at least {minimum} words."
            ),
        },
        Err(SummarizeError::Load(e)) => {
            format!("❌ The model '{}' could not be loaded: {e}", model.label())
        }
        Err(SummarizeError::Inference(e)) => {
            let what = match source {
                Source::Text => "text",
                Source::Pdf { .. } => "document",
            };
            format!("❌ Error: {e}\n\nTry a shorter {what} or switch model.")
        }
    }
}

/// Render an extraction failure as the assistant's reply.
pub fn render_extraction_error(error: &ExtractionError) -> String {
    match error {
        ExtractionError::NoText => "⚠️ No text could be extracted from the PDF.".to_string(),
        other => format!("❌ Error reading the PDF: {other}"),
    }
}

/// The summary plus its statistics block.
pub fn format_summary(result: &SummarizationResult, source: Source<'_>) -> String {
    let file_line = match source {
        Source::Pdf { file_name } => format!("- 📁 File: {file_name}\n"),
        Source::Text => String::new(),
    };

    format!(
        "**📄 GENERATED SUMMARY:**\n\n\
         {summary}\n\n\
         ---\n\n\
         **📊 STATISTICS:**\n\
         {file_line}\
         - 📝 {noun}: {source_words} words\n\
         - ✂️ Summary: {summary_words} words\n\
         - 📉 Compression: {compression:.1}%\n\
         - ⏱️ Time: {elapsed:.2}s\n\
         - 🧠 Model: {model}\n",
        summary = result.summary_text,
        noun = source.noun(),
        source_words = result.source_word_count,
        summary_words = result.summary_word_count,
        compression = result.compression_ratio,
        elapsed = result.elapsed_seconds,
        model = result.model.label(),
    )
}
