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

//! Conversation turns against a bounded, owned message log.
//!
//! # Key Features
//! - One `Conversation` per session, passed explicitly to every call site
//! - Turns are serialized: queued or rejected, never interleaved
//! - Upstream calls retried with exponential backoff, prompt appended once
//! - Boundary replies with status mapping for direct prompts and ingestion

mod caller;
pub mod reply;
mod session;

pub use caller::{DEFAULT_FALLBACK_TEXT, ResilientCaller};
pub use reply::{Reply, ReplyBody, Strings, generate};
pub use session::{ContentionMode, Conversation, ConversationStats};
