//! Error types for the edgequake-summarizer library.
//!
//! Each pipeline component returns its own error type so the chat layer can
//! decide how to present it:
//!
//! * [`ExtractionError`]: the uploaded payload could not be turned into text.
//! * [`LoadError`]: the selected model could not be resolved or materialised.
//! * [`InferenceError`]: the summarization call itself failed.
//! * [`SummarizeError`]: the union returned by
//!   [`crate::pipeline::summarize::summarize`], which adds the short-input
//!   policy rejection on top of load and inference failures.
//!
//! None of these abort the process. The chat layer renders every variant as
//! an assistant message. [`SummarizerError`] is reserved for fatal start-up
//! problems (bad configuration, server bind failures).

use std::path::PathBuf;
use thiserror::Error;

/// Failure to extract text from an uploaded PDF.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// Only `.pdf` uploads are accepted.
    #[error("'{file_name}' is not a PDF file (only .pdf uploads are accepted)")]
    InvalidUpload { file_name: String },

    /// The multipart upload could not be read.
    #[error("upload could not be read: {detail}")]
    Upload { detail: String },

    /// The payload does not start with the `%PDF` magic bytes.
    #[error("file is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// pdfium rejected the document (corrupt header, xref or trailer).
    #[error("PDF is corrupt or unreadable: {detail}")]
    Unreadable { detail: String },

    /// Encrypted documents are not supported.
    #[error("PDF is password protected; encrypted documents are not supported")]
    PasswordProtected,

    /// A page has no text layer pdfium can read.
    #[error("page {page} has no extractable text layer: {detail}")]
    PageText { page: usize, detail: String },

    /// Extraction succeeded but produced nothing but whitespace.
    #[error("no text could be extracted from the PDF")]
    NoText,

    /// The pdfium shared library could not be bound.
    #[error(
        "PDF engine unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install libpdfium system-wide."
    )]
    EngineUnavailable(String),

    /// The blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    TaskFailed(String),
}

/// Failure to resolve or materialise a summarization model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The configured local checkpoint path does not exist.
    #[error("model path '{path}' does not exist")]
    PathNotFound { path: PathBuf },

    /// The path exists but is not a checkpoint directory.
    #[error("'{path}' is not a model checkpoint directory (expected a config.json inside)")]
    NotACheckpoint { path: PathBuf },

    /// The backend provider refused to serve the model.
    #[error("provider '{provider}' could not load '{model}': {detail}")]
    Provider {
        provider: String,
        model: String,
        detail: String,
    },
}

/// Failure of a single summarization call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    /// The backend returned an error; the message is propagated verbatim.
    #[error("{0}")]
    Provider(String),

    /// The model answered with nothing but whitespace.
    #[error("the model returned an empty summary")]
    EmptySummary,
}

/// Everything that can stop a text from being summarized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SummarizeError {
    /// Input is below the minimum word count; no model was loaded or invoked.
    #[error("input too short: {word_count} words (minimum {minimum})")]
    TooShort { word_count: usize, minimum: usize },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Fatal errors surfaced by the binary before or while serving.
#[derive(Debug, Error)]
pub enum SummarizerError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP listener could not be bound.
    #[error("Failed to bind '{addr}': {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
