//! Boundary replies: the response shapes and status mapping shared by every
//! front end (CLI today).

use logrelay_core::{Error, ErrorKind};
use logrelay_providers::gemini::DEFAULT_UNKNOWN_ERROR;
use serde::{Deserialize, Serialize};

use crate::caller::{DEFAULT_FALLBACK_TEXT, ResilientCaller};
use crate::session::Conversation;

/// User-facing strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Strings {
    pub no_content_generated: String,
    pub unknown_error: String,
    pub service_unavailable: String,
    pub missing_prompt: String,
    pub ingest_succeeded: String,
    pub ingest_failed: String,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            no_content_generated: DEFAULT_FALLBACK_TEXT.to_string(),
            unknown_error: DEFAULT_UNKNOWN_ERROR.to_string(),
            service_unavailable: "The AI model is currently unavailable due to high demand. Please try again in a few minutes.".to_string(),
            missing_prompt: "Prompt is required".to_string(),
            ingest_succeeded: "File uploaded and processed successfully".to_string(),
            ingest_failed: "Error processing the log file.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    pub generated_text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngestBody {
    pub message: String,
    pub conversation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReplyBody {
    Generated(GenerateBody),
    Ingested(IngestBody),
    Failed(ErrorBody),
}

/// A status code with its JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: ReplyBody,
}

impl Reply {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.body)
    }

    #[must_use]
    pub fn generated(conversation_text: String) -> Self {
        Self {
            status: 200,
            body: ReplyBody::Generated(GenerateBody {
                generated_text: conversation_text,
            }),
        }
    }

    #[must_use]
    pub fn ingested(conversation: Vec<String>, strings: &Strings) -> Self {
        Self {
            status: 200,
            body: ReplyBody::Ingested(IngestBody {
                message: strings.ingest_succeeded.clone(),
                conversation,
            }),
        }
    }

    fn failed(status: u16, error: String) -> Self {
        Self {
            status,
            body: ReplyBody::Failed(ErrorBody { error }),
        }
    }

    /// Map a direct-prompt failure: overload gets the tailored message,
    /// everything else carries the raw message.
    #[must_use]
    pub fn generate_failure(err: &Error, strings: &Strings) -> Self {
        let kind = err.kind();
        let message = match (kind, err) {
            (ErrorKind::Overloaded, _) => strings.service_unavailable.clone(),
            (_, Error::Upstream(upstream)) if upstream.message.is_empty() => {
                strings.unknown_error.clone()
            }
            (_, Error::Upstream(upstream)) => upstream.message.clone(),
            _ => err.to_string(),
        };
        Self::failed(kind.status_code(), message)
    }

    /// Map an ingestion failure. Input problems are reported as such; anything
    /// else becomes the generic ingestion error.
    #[must_use]
    pub fn ingest_failure(err: &Error, strings: &Strings) -> Self {
        match err.kind() {
            kind @ (ErrorKind::InvalidInput | ErrorKind::Busy) => {
                Self::failed(kind.status_code(), err.to_string())
            }
            _ => Self::failed(500, strings.ingest_failed.clone()),
        }
    }
}

/// Direct-prompt entry point.
///
/// A missing or empty prompt is rejected with 400 before the conversation is
/// touched.
pub async fn generate<P>(
    caller: &ResilientCaller<P>,
    conversation: &Conversation,
    prompt: Option<&str>,
    strings: &Strings,
) -> Reply
where
    P: logrelay_core::UpstreamClient + Send + Sync,
{
    let Some(prompt) = prompt.filter(|p| !p.is_empty()) else {
        return Reply::failed(400, strings.missing_prompt.clone());
    };

    match caller.call(conversation, prompt).await {
        Ok(snapshot) => Reply::generated(snapshot.into_iter().map(|m| m.text).collect()),
        Err(err) => Reply::generate_failure(&err, strings),
    }
}
