//! PDF text extraction via pdfium.
//!
//! Uploads arrive as in-memory byte buffers, so the document is loaded with
//! `load_pdf_from_byte_vec` and never touches the file system. The `%PDF`
//! magic bytes are checked before pdfium is involved so a mislabeled upload
//! gets a clear error instead of a pdfium parse failure.
//!
//! pdfium keeps thread-local state and is not async-safe; all calls run inside
//! `tokio::task::spawn_blocking`.

use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Check the upload's file name and magic bytes without parsing the document.
pub fn validate_upload(file_name: &str, bytes: &[u8]) -> Result<(), ExtractionError> {
    let is_pdf_name = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf_name {
        return Err(ExtractionError::InvalidUpload {
            file_name: file_name.to_string(),
        });
    }
    check_magic(bytes)
}

/// Verify the `%PDF` header.
pub fn check_magic(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(ExtractionError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Extract the text of every page, in document order.
///
/// Each page contributes its text followed by a newline; the result is
/// trimmed. A document whose pages are all blank yields
/// [`ExtractionError::NoText`].
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, ExtractionError> {
    check_magic(&bytes)?;

    tokio::task::spawn_blocking(move || extract_text_blocking(bytes))
        .await
        .map_err(|e| ExtractionError::TaskFailed(format!("extraction task panicked: {e}")))?
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(bytes: Vec<u8>) -> Result<String, ExtractionError> {
    let pdfium = bind_pdfium()?;
    let size = bytes.len();

    let document = pdfium.load_pdf_from_byte_vec(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            ExtractionError::PasswordProtected
        } else {
            ExtractionError::Unreadable { detail: err_str }
        }
    })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages, {} bytes", pages.len(), size);

    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page.text().map_err(|e| ExtractionError::PageText {
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;
        let content = page_text.all();
        debug!("Page {} → {} chars", idx + 1, content.len());
        text.push_str(&content);
        text.push('\n');
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::NoText);
    }
    Ok(text.to_string())
}

/// Bind to the pdfium shared library.
///
/// Lookup order: `PDFIUM_LIB_PATH`, then a library next to the working
/// directory, then the system library search path.
fn bind_pdfium() -> Result<Pdfium, ExtractionError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(Path::new(&path)),
        _ => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractionError::EngineUnavailable(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}
