//! Integration tests for [`summarize_directory`].
//!
//! PDFs are empty placeholder files in a temp directory; text comes from a
//! fake backend keyed by file name and completions from [`MockClient`], so
//! no PDF parsing or HTTP happens.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use abstractor_core::llm::mock::MockReply;
use abstractor_core::llm::{CompletionClient, CompletionFuture};
use abstractor_core::{
    BackendError, Field, MissingFieldPolicy, MockClient, PdfBackend, ProgressEvent, RecordError,
    RunConfig, RunError, summarize_directory,
};
use tokio_util::sync::CancellationToken;

const HOPE_RESPONSE: &str = "- Title: Hope and Healing\n\
- Authors: Smith J\n\
- Month-Year: Jan-2022\n\
- Country: USA\n\
- Citation: Smith, J. (2022). Hope and healing. Journal of Hope, 1(1), 1-9.\n\
- Disease: Chronic kidney disease\n\
- Study Type: Cohort study\n\
- Species: Human\n\
- Scales Used: Herth Hope Index, HADS\n\
- Participants: 85\n\
- Quality of Life: Improved\n\
- Functional Ability: Not reported\n\
- Treatment Adherence: Improved\n\
- Survival: Not assessed\n\
- Summary: Methods: prospective cohort. Results: higher hope, better adherence.\n";

/// Backend returning canned text per file name; unknown names fail to open.
struct FakePdfs {
    texts: HashMap<&'static str, &'static str>,
}

impl FakePdfs {
    fn new(texts: &[(&'static str, &'static str)]) -> Self {
        Self {
            texts: texts.iter().copied().collect(),
        }
    }
}

impl PdfBackend for FakePdfs {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        self.texts
            .get(name)
            .map(|t| t.to_string())
            .ok_or_else(|| BackendError::open(path, "unreadable"))
    }
}

fn dir_with(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in files {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    dir
}

#[tokio::test]
async fn article_scenario_produces_expected_record() {
    let dir = dir_with(&["article1.pdf"]);
    let backend = FakePdfs::new(&[("article1.pdf", "Study of hope...")]);
    let client = MockClient::new(HOPE_RESPONSE);
    let config = RunConfig::new(dir.path());

    let outcome = summarize_directory(&config, &backend, &client, |_| {}, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(record.identifier, "article1");
    assert_eq!(record.field(Field::Title), "Hope and Healing");
    assert_eq!(record.field(Field::Authors), "Smith J");
    assert_eq!(record.field(Field::MonthYear), "Jan-2022");
    assert_eq!(record.text, "Study of hope...");
    assert!(!record.excluded);
    assert!(record.is_complete());
    assert_eq!(outcome.stats.processed, 1);
    assert_eq!(outcome.stats.incomplete, 0);

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].ends_with("Here is the article text: Study of hope..."));
}

#[tokio::test]
async fn empty_directory_yields_no_records() {
    let dir = dir_with(&["notes.txt"]);
    let client = MockClient::new(HOPE_RESPONSE);
    let config = RunConfig::new(dir.path());

    let outcome = summarize_directory(
        &config,
        &FakePdfs::new(&[]),
        &client,
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.total, 0);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn only_lowercase_pdf_files_in_name_order() {
    let dir = dir_with(&["b.pdf", "a.pdf", "C.PDF", "readme.md", "d.pdf.bak"]);
    std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();
    std::fs::write(dir.path().join("nested.pdf").join("inner.pdf"), b"").unwrap();

    let backend = FakePdfs::new(&[("a.pdf", "A"), ("b.pdf", "B")]);
    let client = MockClient::new(HOPE_RESPONSE);
    let config = RunConfig::new(dir.path());

    let outcome = summarize_directory(&config, &backend, &client, |_| {}, CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<_> = outcome.records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn extraction_failure_continues_with_empty_text() {
    let dir = dir_with(&["broken.pdf", "good.pdf"]);
    let backend = FakePdfs::new(&[("good.pdf", "fine text")]);
    let client = MockClient::new(HOPE_RESPONSE);
    let config = RunConfig::new(dir.path());
    let events: Mutex<Vec<ProgressEvent>> = Mutex::new(Vec::new());

    let outcome = summarize_directory(
        &config,
        &backend,
        &client,
        |e| events.lock().unwrap().push(e),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[0].identifier, "broken");
    assert_eq!(outcome.records[0].text, "");
    assert_eq!(outcome.stats.extraction_failures, 1);
    // The empty article is still sent to the model.
    assert_eq!(client.call_count(), 2);
    assert!(client.prompts()[0].ends_with("Here is the article text: "));

    let events = events.into_inner().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::ExtractionFailed { file_name, .. } if file_name == "broken.pdf"
    )));
}

#[tokio::test]
async fn completion_failure_is_lenient_by_default() {
    let dir = dir_with(&["article1.pdf", "article2.pdf"]);
    let backend = FakePdfs::new(&[("article1.pdf", "one"), ("article2.pdf", "two")]);
    let client = MockClient::with_sequence(vec![
        MockReply::Fail("connection reset".into()),
        MockReply::Text(HOPE_RESPONSE.into()),
    ]);
    let config = RunConfig::new(dir.path());
    let events: Mutex<Vec<ProgressEvent>> = Mutex::new(Vec::new());

    let outcome = summarize_directory(
        &config,
        &backend,
        &client,
        |e| events.lock().unwrap().push(e),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.records.len(), 2);
    let failed = &outcome.records[0];
    assert_eq!(failed.missing, Field::ALL.to_vec());
    assert_eq!(failed.field(Field::Title), "");
    assert!(outcome.records[1].is_complete());
    assert_eq!(outcome.stats.completion_failures, 1);
    assert_eq!(outcome.stats.incomplete, 1);

    let events = events.into_inner().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::CompletionFailed { error, .. } if error.contains("connection reset")
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::MissingFields { fields, .. } if fields.len() == 15
    )));
}

#[tokio::test]
async fn completion_failure_aborts_in_strict_mode() {
    let dir = dir_with(&["article0.pdf", "article1.pdf"]);
    let backend = FakePdfs::new(&[("article0.pdf", "zero"), ("article1.pdf", "one")]);
    let client = MockClient::with_sequence(vec![
        MockReply::Text(HOPE_RESPONSE.into()),
        MockReply::Fail("transport error".into()),
    ]);
    let config = RunConfig::new(dir.path()).with_missing_fields(MissingFieldPolicy::Strict);

    let err = summarize_directory(&config, &backend, &client, |_| {}, CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        RunError::Record(RecordError::MissingField { identifier, field }) => {
            assert_eq!(identifier, "article1");
            assert_eq!(field, Field::Title);
        }
        other => panic!("expected missing field error, got {other:?}"),
    }
}

#[tokio::test]
async fn partial_response_reports_only_missing_fields() {
    let dir = dir_with(&["x.pdf"]);
    let response = HOPE_RESPONSE.replace("- Participants: 85\n", "");
    let client = MockClient::new(response);
    let config = RunConfig::new(dir.path());

    let outcome = summarize_directory(
        &config,
        &FakePdfs::new(&[("x.pdf", "text")]),
        &client,
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.records[0].missing, vec![Field::Participants]);
    assert_eq!(outcome.records[0].field(Field::Country), "USA");
}

#[tokio::test]
async fn cancelled_run_stops_before_next_article() {
    let dir = dir_with(&["a.pdf", "b.pdf"]);
    let client = MockClient::new(HOPE_RESPONSE);
    let config = RunConfig::new(dir.path());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = summarize_directory(
        &config,
        &FakePdfs::new(&[("a.pdf", "A"), ("b.pdf", "B")]),
        &client,
        |_| {},
        cancel,
    )
    .await
    .unwrap();

    assert!(outcome.records.is_empty());
    assert!(outcome.stats.cancelled);
    assert_eq!(outcome.stats.total, 2);
    assert_eq!(client.call_count(), 0);
}

/// Answers the first `answered` requests, then never responds.
struct StallingClient {
    calls: AtomicUsize,
    answered: usize,
}

impl CompletionClient for StallingClient {
    fn name(&self) -> &str {
        "stalling"
    }

    fn complete<'a>(&'a self, _system: &'a str, _prompt: &'a str) -> CompletionFuture<'a> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if call < self.answered {
                Ok(HOPE_RESPONSE.to_string())
            } else {
                std::future::pending().await
            }
        })
    }
}

#[tokio::test]
async fn cancel_abandons_request_in_flight() {
    let dir = dir_with(&["a.pdf", "b.pdf", "c.pdf"]);
    let client = StallingClient {
        calls: AtomicUsize::new(0),
        answered: 1,
    };
    let config = RunConfig::new(dir.path());
    let events = Mutex::new(Vec::new());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        summarize_directory(
            &config,
            &FakePdfs::new(&[("a.pdf", "A"), ("b.pdf", "B"), ("c.pdf", "C")]),
            &client,
            |e| events.lock().unwrap().push(e),
            cancel,
        ),
    )
    .await
    .expect("run returns once cancelled")
    .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].identifier, "a");
    assert!(outcome.stats.cancelled);
    assert_eq!(outcome.stats.processed, 1);
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    let events = events.into_inner().unwrap();
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Cancelled {
            processed: 1,
            total: 3
        })
    ));
}

#[tokio::test]
async fn finished_run_is_not_marked_cancelled() {
    let dir = dir_with(&["a.pdf"]);
    let cancel = CancellationToken::new();

    let outcome = summarize_directory(
        &RunConfig::new(dir.path()),
        &FakePdfs::new(&[("a.pdf", "A")]),
        &MockClient::new(HOPE_RESPONSE),
        |_| {},
        cancel.clone(),
    )
    .await
    .unwrap();
    cancel.cancel();

    assert!(!outcome.stats.cancelled);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn custom_topic_reaches_prompt() {
    let dir = dir_with(&["a.pdf"]);
    let client = MockClient::new(HOPE_RESPONSE);
    let config = RunConfig::new(dir.path()).with_topic("resilience in cancer survivors");

    summarize_directory(
        &config,
        &FakePdfs::new(&[("a.pdf", "A")]),
        &client,
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(client.prompts()[0].contains("literature review about resilience in cancer survivors."));
}

#[tokio::test]
async fn missing_input_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::new(dir.path().join("does-not-exist"));

    let err = summarize_directory(
        &config,
        &FakePdfs::new(&[]),
        &MockClient::new(""),
        |_| {},
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RunError::InputDir { .. }));
}
