#![deny(
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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod log;
pub mod protocol;

pub use error::{Error, ErrorKind, Result, UpstreamError, UpstreamResult};
pub use log::{Message, MessageLog};
pub use protocol::encode;

/// Protocol role of a turn, derived from its position in the log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The turn at position 0, treated as the initiating turn.
    Context,
    Requester,
    Responder,
}

/// One encoded turn, ready to be rendered into an upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// A generative-content backend.
///
/// Implementations issue exactly one request per call and never retry on
/// their own; retry policy belongs to the caller. `Ok(None)` means the
/// upstream answered successfully but carried no generated text.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn generate(&self, turns: &[Turn]) -> UpstreamResult<Option<String>>;

    fn model(&self) -> &str;
}

#[async_trait]
impl<T: UpstreamClient + ?Sized> UpstreamClient for std::sync::Arc<T> {
    async fn generate(&self, turns: &[Turn]) -> UpstreamResult<Option<String>> {
        (**self).generate(turns).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}
