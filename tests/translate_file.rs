use assert_fs::prelude::*;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use legendas::cancel::CancelFlag;
use legendas::config::Config;
use legendas::error::{LegendasError, Result};
use legendas::inference::{GenerateRequest, InferenceService, ModelInfo};
use legendas::progress::LogProgress;
use legendas::workflow::Workflow;

const SOURCE: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n\
2\n00:00:03,000 --> 00:00:04,000\nHow are you?\nFine.\n\n\
3\n00:00:05,000 --> 00:00:06,000\nBye\n";

/// Answers every prompt by prefixing each requested line, except for the
/// indices in `always_drop`.
struct EchoService {
    available: bool,
    always_drop: HashSet<u32>,
    calls: AtomicUsize,
}

impl EchoService {
    fn new() -> Self {
        Self {
            available: true,
            always_drop: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl InferenceService for EchoService {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let body = request.prompt
            .split("[/INST]\n")
            .nth(1)
            .unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(body)?;

        let translations: Vec<serde_json::Value> = value["entries"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|e| {
                let index = e["index"].as_u64().unwrap_or_default() as u32;
                !self.always_drop.contains(&index)
            })
            .map(|e| {
                let lines: Vec<String> = e["lines"]
                    .as_array()
                    .map(Vec::as_slice)
                    .unwrap_or_default()
                    .iter()
                    .map(|l| format!("PT {}", l.as_str().unwrap_or_default()))
                    .collect();
                serde_json::json!({ "index": e["index"], "lines": lines })
            })
            .collect();

        Ok(format!(
            "<think>ok</think>```json\n{}\n```",
            serde_json::json!({ "translations": translations })
        ))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        if self.available {
            Ok(vec![ModelInfo { name: "deepseek-r1:14b".to_string(), size: 0 }])
        } else {
            Err(LegendasError::Transport("connection refused".to_string()))
        }
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.translate.batch_size = 2;
    config.translate.batch_delay_ms = 0;
    config
}

fn workflow(service: EchoService) -> (Workflow, Arc<EchoService>) {
    let service = Arc::new(service);
    (Workflow::with_service(test_config(), service.clone()), service)
}

#[tokio::test]
async fn translates_file_next_to_input() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("movie.en.srt");
    input.write_str(SOURCE).unwrap();

    let (workflow, service) = workflow(EchoService::new());
    let result = workflow
        .translate_file(input.path(), None, &LogProgress, &CancelFlag::new())
        .await;
    let translated = tokio_test::assert_ok!(result);

    assert_eq!(translated.output_path, temp.child("movie.pt_br.srt").path());
    assert_eq!(translated.summary.entries, 3);
    assert_eq!(translated.summary.batches, 2);
    assert_eq!(translated.summary.swept_entries, 0);
    assert_eq!(service.calls.load(Ordering::SeqCst), 2);

    temp.child("movie.pt_br.srt").assert(
        "1\n00:00:01,000 --> 00:00:02,000\nPT Hello\n\n\
2\n00:00:03,000 --> 00:00:04,000\nPT How are you?\nPT Fine.\n\n\
3\n00:00:05,000 --> 00:00:06,000\nPT Bye\n",
    );
    input.assert(SOURCE);
}

#[tokio::test]
async fn explicit_output_path_is_used() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("episode.srt");
    input.write_str(SOURCE).unwrap();
    let output = temp.child("out").child("custom.srt");
    std::fs::create_dir_all(temp.child("out").path()).unwrap();

    let (workflow, _) = workflow(EchoService::new());
    let translated = workflow
        .translate_file(input.path(), Some(output.path()), &LogProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(translated.output_path, output.path());
    assert!(std::fs::read_to_string(output.path()).unwrap().contains("PT Bye"));
    assert!(!temp.child("episode.pt_br.srt").path().exists());
}

#[tokio::test]
async fn unavailable_service_writes_nothing() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("movie.en.srt");
    input.write_str(SOURCE).unwrap();

    let mut service = EchoService::new();
    service.available = false;
    let (workflow, service) = workflow(service);

    let result = workflow
        .translate_file(input.path(), None, &LogProgress, &CancelFlag::new())
        .await;

    assert!(matches!(result, Err(LegendasError::ServiceUnavailable(_))));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    assert!(!temp.child("movie.pt_br.srt").path().exists());
}

#[tokio::test]
async fn dropped_entry_fails_without_writing() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("movie.en.srt");
    input.write_str(SOURCE).unwrap();

    let mut service = EchoService::new();
    service.always_drop.insert(2);
    let (workflow, _) = workflow(service);

    let result = workflow
        .translate_file(input.path(), None, &LogProgress, &CancelFlag::new())
        .await;

    match result {
        Err(LegendasError::IncompleteTranslation { unresolved }) => assert_eq!(unresolved, 1),
        other => panic!("expected incomplete translation, got {:?}", other.map(|t| t.summary)),
    }
    assert!(!temp.child("movie.pt_br.srt").path().exists());
}

#[tokio::test]
async fn empty_file_is_rejected() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("empty.en.srt");
    input.write_str("\n\n").unwrap();

    let (workflow, service) = workflow(EchoService::new());
    let result = workflow
        .translate_file(input.path(), None, &LogProgress, &CancelFlag::new())
        .await;

    assert!(matches!(result, Err(LegendasError::EmptyInput)));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_run_leaves_no_output() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("movie.en.srt");
    input.write_str(SOURCE).unwrap();

    let cancel = CancelFlag::new();
    cancel.cancel();
    let (workflow, _) = workflow(EchoService::new());

    let err = workflow
        .translate_file(input.path(), None, &LogProgress, &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(!temp.child("movie.pt_br.srt").path().exists());
    input.assert(SOURCE);
}

#[tokio::test]
async fn missing_input_and_self_overwrite() {
    let temp = assert_fs::TempDir::new().unwrap();
    let (workflow, _) = workflow(EchoService::new());

    let missing = workflow
        .translate_file(temp.child("nope.srt").path(), None, &LogProgress, &CancelFlag::new())
        .await;
    assert!(matches!(missing, Err(LegendasError::FileNotFound(_))));

    let input = temp.child("movie.pt_br.srt");
    input.write_str(SOURCE).unwrap();
    let same = workflow
        .translate_file(input.path(), Some(input.path()), &LogProgress, &CancelFlag::new())
        .await;
    assert!(matches!(same, Err(LegendasError::Config(_))));
    input.assert(SOURCE);
}
