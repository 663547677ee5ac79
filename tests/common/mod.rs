//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use edgequake_summarizer::{
    Device, InferenceError, LoadError, ModelChoice, ModelRegistry, PipelineLoader,
    SummarizationPipeline,
};
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Returns the first five words of its input and records every input.
#[derive(Default)]
pub struct RecordingPipeline {
    pub inputs: Mutex<Vec<String>>,
}

impl RecordingPipeline {
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

impl SummarizationPipeline for RecordingPipeline {
    fn summarize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, InferenceError>> {
        async move {
            self.inputs.lock().unwrap().push(text.to_string());
            let head: Vec<&str> = text.split_whitespace().take(5).collect();
            Ok(format!("{}.", head.join(" ")))
        }
        .boxed()
    }
}

/// Always fails with the given message.
pub struct FailingPipeline(pub String);

impl SummarizationPipeline for FailingPipeline {
    fn summarize<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<String, InferenceError>> {
        async move { Err(InferenceError::Provider(self.0.clone())) }.boxed()
    }
}

/// Hands out one shared pipeline and counts how often it was asked to.
pub struct FakeLoader {
    pub loads: AtomicUsize,
    pipeline: Option<Arc<dyn SummarizationPipeline>>,
}

impl FakeLoader {
    pub fn serving(pipeline: Arc<dyn SummarizationPipeline>) -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            pipeline: Some(pipeline),
        })
    }

    /// A loader whose every load fails.
    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            pipeline: None,
        })
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl PipelineLoader for FakeLoader {
    fn load(
        &self,
        choice: ModelChoice,
        _device: Device,
    ) -> BoxFuture<'_, Result<Arc<dyn SummarizationPipeline>, LoadError>> {
        async move {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.pipeline.clone().ok_or_else(|| LoadError::Provider {
                provider: "fake".into(),
                model: choice.slug().into(),
                detail: "backend offline".into(),
            })
        }
        .boxed()
    }
}

pub fn registry(loader: &Arc<FakeLoader>) -> ModelRegistry {
    ModelRegistry::new(Arc::clone(loader) as Arc<dyn PipelineLoader>, Device::Cpu)
}

/// `n` space-separated words.
pub fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A one-page PDF with one Helvetica text line per entry of `lines`.
pub fn minimal_pdf(lines: &[&str]) -> Vec<u8> {
    let mut content = String::from("BT /F1 11 Tf 72 720 Td 14 TL\n");
    for line in lines {
        content.push_str(&format!("({line}) Tj T*\n"));
    }
    content.push_str("ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
    }

    let xref = pdf.len();
    pdf.extend_from_slice(
        format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
    );
    for off in offsets {
        pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    pdf
}
