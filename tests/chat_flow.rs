//! Chat-level behaviour with fake models: transcript growth, the length
//! gate, truncation, determinism and error rendering.

mod common;

use common::{registry, words, FailingPipeline, FakeLoader, RecordingPipeline};
use edgequake_summarizer::chat::{self, PDF_MESSAGE_PREFIX};
use edgequake_summarizer::error::ExtractionError;
use edgequake_summarizer::pipeline::summarize::invoke;
use edgequake_summarizer::{
    summarize, ModelChoice, Role, Session, SummarizationPipeline, SummarizeError,
    INPUT_CHAR_BUDGET,
};
use std::sync::Arc;

fn recording() -> (Arc<RecordingPipeline>, Arc<FakeLoader>) {
    let pipeline = Arc::new(RecordingPipeline::default());
    let loader = FakeLoader::serving(Arc::clone(&pipeline) as Arc<dyn SummarizationPipeline>);
    (pipeline, loader)
}

#[tokio::test]
async fn each_action_appends_one_pair_and_reset_clears() {
    let (_, loader) = recording();
    let reg = registry(&loader);

    let mut session = Session::new();
    for n in 1..=3 {
        session = chat::submit_text(session, &reg, &words(80)).await;
        assert_eq!(session.transcript.len(), 2 * n);
    }
    session = chat::submit_text(session, &reg, "too short").await;
    assert_eq!(session.transcript.len(), 8);

    let roles: Vec<Role> = session.transcript.messages().iter().map(|m| m.role).collect();
    for pair in roles.chunks(2) {
        assert_eq!(pair, [Role::User, Role::Assistant]);
    }

    session = chat::reset(session);
    assert!(session.transcript.is_empty());
}

#[tokio::test]
async fn short_input_never_loads_a_model() {
    let (pipeline, loader) = recording();
    let reg = registry(&loader);

    let session = chat::submit_text(Session::new(), &reg, &words(49)).await;
    let reply = &session.transcript.messages()[1].content;
    assert_eq!(
        reply,
        "⚠️ The article is too short (49 words). Please send an article with at least 50 words."
    );
    assert_eq!(loader.load_count(), 0);
    assert!(pipeline.inputs().is_empty());
    assert!(!reg.is_loaded(ModelChoice::Custom).await);
}

#[tokio::test]
async fn fifty_words_is_enough() {
    let (_, loader) = recording();
    let reg = registry(&loader);
    assert!(summarize(&reg, ModelChoice::Custom, &words(50)).await.is_ok());
    assert_eq!(loader.load_count(), 1);
}

#[tokio::test]
async fn sixty_repetitions_of_test() {
    let (_, loader) = recording();
    let reg = registry(&loader);
    let input = vec!["test"; 60].join(" ");

    let result = summarize(&reg, ModelChoice::DistilBartCnn, &input)
        .await
        .unwrap();
    assert_eq!(result.source_word_count, 60);
    assert!(result.summary_word_count > 0);
    let expected = (1.0 - result.summary_word_count as f64 / 60.0) * 100.0;
    assert!((result.compression_ratio - expected).abs() < 1e-9);
    assert_eq!(result.model, ModelChoice::DistilBartCnn);
}

#[tokio::test]
async fn model_sees_only_the_first_1024_characters() {
    let (pipeline, loader) = recording();
    let reg = registry(&loader);
    let input = words(2000);
    assert!(input.chars().count() > INPUT_CHAR_BUDGET);

    let result = summarize(&reg, ModelChoice::Custom, &input).await.unwrap();
    let inputs = pipeline.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].chars().count(), INPUT_CHAR_BUDGET);
    assert!(input.starts_with(&inputs[0]));
    // Statistics describe the whole input, not the truncated slice.
    assert_eq!(result.source_word_count, 2000);
}

#[tokio::test]
async fn same_input_same_summary() {
    let (_, loader) = recording();
    let reg = registry(&loader);
    let input = words(120);

    let first = summarize(&reg, ModelChoice::BartLargeCnn, &input).await.unwrap();
    let second = summarize(&reg, ModelChoice::BartLargeCnn, &input).await.unwrap();
    assert_eq!(first.summary_text, second.summary_text);
    assert_eq!(loader.load_count(), 1);
}

#[tokio::test]
async fn switching_models_loads_each_once() {
    let (_, loader) = recording();
    let reg = registry(&loader);

    let mut session = Session::new();
    for choice in [
        ModelChoice::Custom,
        ModelChoice::BartLargeCnn,
        ModelChoice::Custom,
        ModelChoice::BartLargeCnn,
    ] {
        session = chat::select_model(session, choice);
        session = chat::submit_text(session, &reg, &words(60)).await;
    }
    assert_eq!(loader.load_count(), 2);
    let last = &session.transcript.messages()[7].content;
    assert!(last.contains("- 🧠 Model: facebook/bart-large-cnn"));
}

#[tokio::test]
async fn inference_failure_becomes_assistant_message() {
    let loader = FakeLoader::serving(Arc::new(FailingPipeline("CUDA out of memory".into())));
    let reg = registry(&loader);

    let session = chat::submit_text(Session::new(), &reg, &words(70)).await;
    assert_eq!(session.transcript.len(), 2);
    assert_eq!(
        session.transcript.messages()[1].content,
        "❌ Error: CUDA out of memory\n\nTry a shorter text or switch model."
    );
}

#[tokio::test]
async fn load_failure_is_not_cached_and_is_reported() {
    let loader = FakeLoader::broken();
    let reg = registry(&loader);

    let mut session = Session::new();
    session = chat::submit_text(session, &reg, &words(70)).await;
    session = chat::submit_text(session, &reg, &words(70)).await;
    assert_eq!(loader.load_count(), 2);
    let reply = &session.transcript.messages()[3].content;
    assert!(reply.starts_with("❌ The model 'Your custom model' could not be loaded"));
    assert!(reply.contains("backend offline"));
}

#[tokio::test]
async fn summary_reply_has_statistics_block() {
    let (_, loader) = recording();
    let reg = registry(&loader);

    let session = chat::submit_text(Session::new(), &reg, &words(100)).await;
    let reply = &session.transcript.messages()[1].content;
    assert!(reply.starts_with("**📄 GENERATED SUMMARY:**\n\nword0 word1 word2 word3 word4."));
    assert!(reply.contains("**📊 STATISTICS:**"));
    assert!(reply.contains("- 📝 Article: 100 words"));
    assert!(reply.contains("- ✂️ Summary: 5 words"));
    assert!(reply.contains("- 📉 Compression: 95.0%"));
}

#[tokio::test]
async fn garbage_pdf_is_reported_without_touching_the_model() {
    let (_, loader) = recording();
    let reg = registry(&loader);

    let session = chat::submit_pdf(
        Session::new(),
        &reg,
        "scan.pdf",
        Ok(b"this is not a pdf at all".to_vec()),
    )
    .await;
    let messages = session.transcript.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, format!("{PDF_MESSAGE_PREFIX}scan.pdf"));
    assert!(messages[1].content.starts_with("❌ Error reading the PDF"));
    assert_eq!(loader.load_count(), 0);
}

#[tokio::test]
async fn non_pdf_upload_is_rejected() {
    let (_, loader) = recording();
    let reg = registry(&loader);

    let session = chat::submit_pdf(Session::new(), &reg, "notes.docx", Ok(b"%PDF-1.7".to_vec())).await;
    let reply = &session.transcript.messages()[1].content;
    assert!(reply.contains("'notes.docx' is not a PDF file"));
}

#[tokio::test]
async fn broken_upload_is_reported() {
    let (_, loader) = recording();
    let reg = registry(&loader);

    let session = chat::submit_pdf(
        Session::new(),
        &reg,
        "big.pdf",
        Err(ExtractionError::Upload {
            detail: "length limit exceeded".into(),
        }),
    )
    .await;
    assert_eq!(session.transcript.len(), 2);
    assert!(session.transcript.messages()[1]
        .content
        .contains("length limit exceeded"));
}

#[tokio::test]
async fn empty_model_output_is_an_error() {
    struct Blank;
    impl SummarizationPipeline for Blank {
        fn summarize<'a>(
            &'a self,
            _text: &'a str,
        ) -> futures::future::BoxFuture<'a, Result<String, edgequake_summarizer::InferenceError>>
        {
            use futures::FutureExt;
            async { Ok("```\n  \n```".to_string()) }.boxed()
        }
    }

    let loader = FakeLoader::serving(Arc::new(Blank));
    let reg = registry(&loader);
    let handle = reg.get_or_load(ModelChoice::Custom).await.unwrap();
    let err = invoke(&handle, &words(60)).await.unwrap_err();
    assert_eq!(err.to_string(), "the model returned an empty summary");

    let outcome = summarize(&reg, ModelChoice::Custom, &words(60)).await;
    assert!(matches!(outcome, Err(SummarizeError::Inference(_))));
}
