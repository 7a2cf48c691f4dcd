//! End-to-end ingestion of files on disk through a recording upstream.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use logrelay_conversation::{Conversation, ReplyBody, ResilientCaller, Strings};
use logrelay_core::{ErrorKind, Turn, UpstreamClient, UpstreamError, UpstreamResult};
use logrelay_ingest::{IngestOptions, TextEncoding, ingest_file, ingest_reply};
use logrelay_providers::RetryPolicy;
use tempfile::NamedTempFile;

/// Records the prompt of every request and fails calls whose 1-based number
/// is listed in `fail_on`.
struct RecordingUpstream {
    prompts: Mutex<Vec<String>>,
    fail_on: Vec<usize>,
}

impl RecordingUpstream {
    fn new(fail_on: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            fail_on,
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamClient for RecordingUpstream {
    async fn generate(&self, turns: &[Turn]) -> UpstreamResult<Option<String>> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(turns.last().map(|t| t.content.clone()).unwrap_or_default());
        let call = prompts.len();
        if self.fail_on.contains(&call) {
            return Err(UpstreamError::new(Some(500), "internal"));
        }
        Ok(Some(format!("summary {call}")))
    }

    fn model(&self) -> &str {
        "recording"
    }
}

fn log_file(lines: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for i in 1..=lines {
        writeln!(file, "2024-01-01T00:00:{i:02} INFO event {i}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn no_retry(upstream: Arc<RecordingUpstream>) -> ResilientCaller<Arc<RecordingUpstream>> {
    ResilientCaller::new(upstream, RetryPolicy::new(0, Duration::ZERO))
}

fn options(batch_size: usize) -> IngestOptions {
    IngestOptions {
        batch_size,
        ..IngestOptions::default()
    }
}

#[tokio::test]
async fn forty_five_lines_become_three_turns() {
    let file = log_file(45);
    let upstream = RecordingUpstream::new(vec![]);
    let caller = no_retry(upstream.clone());
    let conversation = Conversation::new(1_000_000, "context").unwrap();

    let outcome = ingest_file(file.path(), &options(20), &caller, &conversation)
        .await
        .unwrap();

    assert_eq!(outcome.report.lines, 45);
    assert_eq!(outcome.report.batches, 3);

    let prompts = upstream.prompts();
    let line_counts: Vec<usize> = prompts.iter().map(|p| p.lines().count()).collect();
    assert_eq!(line_counts, vec![20, 20, 5]);
    assert!(prompts[0].starts_with("2024-01-01T00:00:01 INFO event 1\n"));
    assert!(prompts[2].starts_with("2024-01-01T00:00:41 INFO event 41\n"));
    assert!(prompts[2].ends_with("event 45"));

    // context + (prompt, response) per batch
    assert_eq!(outcome.conversation.len(), 7);
    assert_eq!(outcome.conversation[6], "summary 3");
}

#[tokio::test]
async fn utf16le_files_are_decoded() {
    let mut file = NamedTempFile::new().unwrap();
    let text = "\u{FEFF}première ligne\r\nzweite Zeile\r\n";
    let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();

    let upstream = RecordingUpstream::new(vec![]);
    let caller = no_retry(upstream.clone());
    let conversation = Conversation::new(1_000_000, "context").unwrap();
    let options = IngestOptions {
        batch_size: 10,
        encoding: TextEncoding::Utf16Le,
        ..IngestOptions::default()
    };

    ingest_file(file.path(), &options, &caller, &conversation)
        .await
        .unwrap();

    assert_eq!(upstream.prompts(), vec!["première ligne\nzweite Zeile"]);
}

#[tokio::test]
async fn failure_keeps_earlier_batches() {
    let file = log_file(45);
    let upstream = RecordingUpstream::new(vec![2]);
    let caller = no_retry(upstream.clone());
    let conversation = Conversation::new(1_000_000, "context").unwrap();

    let err = ingest_file(file.path(), &options(20), &caller, &conversation)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(upstream.prompts().len(), 2);

    // First batch's turn survives, second batch's prompt stays without a response.
    let texts = conversation.texts().await;
    assert_eq!(texts.len(), 4);
    assert_eq!(texts[2], "summary 1");
}

#[tokio::test]
async fn trailing_blank_line_batch_is_skipped() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"a\nb\n\n").unwrap();
    file.flush().unwrap();
    let upstream = RecordingUpstream::new(vec![]);
    let caller = no_retry(upstream.clone());
    let conversation = Conversation::new(1_000, "context").unwrap();

    let outcome = ingest_file(file.path(), &options(2), &caller, &conversation)
        .await
        .unwrap();

    assert_eq!(outcome.report.lines, 3);
    assert_eq!(upstream.prompts(), vec!["a\nb"]);
    assert_eq!(outcome.conversation, vec!["context", "a\nb", "summary 1"]);
}

#[tokio::test]
async fn blank_lines_with_single_line_batches_are_skipped() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"first\n\nsecond\n").unwrap();
    file.flush().unwrap();
    let upstream = RecordingUpstream::new(vec![]);
    let caller = no_retry(upstream.clone());
    let conversation = Conversation::new(1_000, "context").unwrap();

    ingest_file(file.path(), &options(1), &caller, &conversation)
        .await
        .unwrap();

    assert_eq!(upstream.prompts(), vec!["first", "second"]);
}

#[tokio::test]
async fn empty_file_is_invalid_input() {
    let file = NamedTempFile::new().unwrap();
    let upstream = RecordingUpstream::new(vec![]);
    let caller = no_retry(upstream.clone());
    let conversation = Conversation::new(1_000, "context").unwrap();

    let err = ingest_file(file.path(), &options(20), &caller, &conversation)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(upstream.prompts().is_empty());
}

#[tokio::test]
async fn oversized_file_is_rejected_before_reading() {
    let file = log_file(100);
    let upstream = RecordingUpstream::new(vec![]);
    let caller = no_retry(upstream.clone());
    let conversation = Conversation::new(1_000, "context").unwrap();
    let options = IngestOptions {
        max_file_bytes: 64,
        ..IngestOptions::default()
    };

    let err = ingest_file(file.path(), &options, &caller, &conversation)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(upstream.prompts().is_empty());
}

#[tokio::test]
async fn missing_file_is_a_filesystem_error() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = RecordingUpstream::new(vec![]);
    let caller = no_retry(upstream);
    let conversation = Conversation::new(1_000, "context").unwrap();

    let err = ingest_file(
        &dir.path().join("missing.log"),
        &options(20),
        &caller,
        &conversation,
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Filesystem);
}

#[tokio::test]
async fn reply_carries_the_whole_conversation() {
    let file = log_file(3);
    let upstream = RecordingUpstream::new(vec![]);
    let caller = no_retry(upstream);
    let conversation = Conversation::new(1_000_000, "context").unwrap();
    let strings = Strings::default();

    let reply = ingest_reply(file.path(), &options(20), &caller, &conversation, &strings).await;

    assert_eq!(reply.status, 200);
    let body = match &reply.body {
        ReplyBody::Ingested(body) => body,
        other => panic!("expected an ingestion reply, got {other:?}"),
    };
    assert_eq!(body.message, strings.ingest_succeeded);
    assert_eq!(body.conversation.len(), 3);
    assert_eq!(body.conversation[2], "summary 1");
}

#[tokio::test]
async fn reply_hides_upstream_details_on_failure() {
    let file = log_file(3);
    let upstream = RecordingUpstream::new(vec![1]);
    let caller = no_retry(upstream);
    let conversation = Conversation::new(1_000_000, "context").unwrap();
    let strings = Strings::default();

    let reply = ingest_reply(file.path(), &options(20), &caller, &conversation, &strings).await;

    assert_eq!(reply.status, 500);
    assert!(reply.to_json().unwrap().contains(&strings.ingest_failed));
}
