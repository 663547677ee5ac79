//! Pipeline stages for summarizing an article or a PDF.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ summarize ──▶ registry ──▶ model ──▶ postprocess
//! (pdfium)    (policy)      (cache)      (LLM)     (cleanup)
//! ```
//!
//! 1. [`extract`]    : PDF bytes to plain text; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 2. [`summarize`]  : minimum-length gate, input truncation, timing and
//!    word statistics
//! 3. [`registry`]   : loads each model at most once and hands out shared
//!    handles
//! 4. [`model`]      : model choices, device detection, and the
//!    loader/pipeline traits; the only stage with network I/O
//! 5. [`postprocess`]: deterministic cleanup of the raw model output

pub mod extract;
pub mod model;
pub mod postprocess;
pub mod registry;
pub mod summarize;
