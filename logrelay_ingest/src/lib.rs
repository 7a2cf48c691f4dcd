#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Streaming ingestion of large line-oriented files.
//!
//! A file is read line by line, grouped into bounded batches and fed through
//! a conversation one batch at a time. Reading pauses while a batch's upstream
//! call is pending.

mod ingest;
mod pipeline;
mod source;

pub use ingest::{DEFAULT_MAX_FILE_BYTES, IngestOptions, IngestOutcome, ingest_file, ingest_reply};
pub use pipeline::{Batch, BatchPipeline, DEFAULT_BATCH_SIZE, IngestReport};
pub use source::{LineSource, TextEncoding};
