//! File ingestion: validate, stream in batches, feed each batch as a turn.

use std::path::Path;

use logrelay_conversation::{Conversation, Reply, ResilientCaller, Strings};
use logrelay_core::{Error, Result, UpstreamClient};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::pipeline::{BatchPipeline, DEFAULT_BATCH_SIZE, IngestReport};
use crate::source::{LineSource, TextEncoding};

/// Default upper bound on an ingested file's size (10 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    pub batch_size: usize,
    pub encoding: TextEncoding,
    pub max_file_bytes: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            encoding: TextEncoding::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub report: IngestReport,
    /// Conversation texts after the last batch.
    pub conversation: Vec<String>,
}

/// Ingest `path` into `conversation`, one turn per batch.
///
/// A batch whose joined text is empty (a lone blank line) is skipped.
///
/// Not atomic: if a batch fails, the turns of earlier batches stay in the
/// conversation and the error is returned.
pub async fn ingest_file<P>(
    path: &Path,
    options: &IngestOptions,
    caller: &ResilientCaller<P>,
    conversation: &Conversation,
) -> Result<IngestOutcome>
where
    P: UpstreamClient + Send + Sync,
{
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::filesystem(path, e))?;
    if !metadata.is_file() {
        return Err(Error::invalid_input(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(Error::invalid_input("uploaded file is empty"));
    }
    if metadata.len() > options.max_file_bytes {
        return Err(Error::invalid_input(format!(
            "file is {} bytes, the limit is {} bytes",
            metadata.len(),
            options.max_file_bytes
        )));
    }

    let pipeline = BatchPipeline::new(options.batch_size)?;
    let mut source = LineSource::open(path, options.encoding).await?;

    info!(
        "Ingesting {} ({} bytes, {}, batches of {} lines) into conversation {}",
        path.display(),
        metadata.len(),
        options.encoding,
        pipeline.batch_size(),
        conversation.id()
    );

    let report = pipeline
        .run(&mut source, move |batch| async move {
            let prompt = batch.to_prompt();
            if prompt.is_empty() {
                debug!("Batch {} holds only a blank line, skipping", batch.ordinal());
                return Ok(());
            }
            let snapshot = caller.call(conversation, &prompt).await?;
            info!(
                "Batch {} ({} lines) processed, conversation holds {} messages",
                batch.ordinal(),
                batch.len(),
                snapshot.len()
            );
            Ok(())
        })
        .await?;

    Ok(IngestOutcome {
        report,
        conversation: conversation.texts().await,
    })
}

/// File-ingestion entry point: run `ingest_file` and map the result to a reply.
pub async fn ingest_reply<P>(
    path: &Path,
    options: &IngestOptions,
    caller: &ResilientCaller<P>,
    conversation: &Conversation,
    strings: &Strings,
) -> Reply
where
    P: UpstreamClient + Send + Sync,
{
    match ingest_file(path, options, caller, conversation).await {
        Ok(outcome) => Reply::ingested(outcome.conversation, strings),
        Err(err) => {
            error!("Error processing log file {}: {err}", path.display());
            Reply::ingest_failure(&err, strings)
        }
    }
}
