//! Resilient upstream calls against a conversation.

use std::sync::Arc;

use logrelay_core::{Error, Message, MessageLog, Result, UpstreamClient, encode};
use logrelay_providers::{RetryPolicy, retry_with_backoff};
use tracing::{debug, info};

use crate::session::Conversation;

pub const DEFAULT_FALLBACK_TEXT: &str = "No content generated";

/// Drives one conversation turn: append the prompt, call upstream with
/// backoff, append the response.
pub struct ResilientCaller<P = Arc<dyn UpstreamClient>>
where
    P: Send + Sync,
{
    provider: P,
    policy: RetryPolicy,
    fallback_text: String,
}

impl<P> ResilientCaller<P>
where
    P: UpstreamClient + Send + Sync,
{
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
        }
    }

    /// Text appended when the upstream succeeds without generated text.
    #[must_use]
    pub fn with_fallback_text(mut self, fallback_text: String) -> Self {
        self.fallback_text = fallback_text;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one turn with the caller's default retry policy.
    pub async fn call(&self, conversation: &Conversation, prompt: &str) -> Result<Vec<Message>> {
        self.call_with_policy(conversation, prompt, &self.policy)
            .await
    }

    /// Run one turn and return the updated snapshot.
    ///
    /// The prompt is appended exactly once, before the first attempt. On
    /// failure the prompt stays in the log; the response is appended only on
    /// success.
    pub async fn call_with_policy(
        &self,
        conversation: &Conversation,
        prompt: &str,
        policy: &RetryPolicy,
    ) -> Result<Vec<Message>> {
        if prompt.is_empty() {
            return Err(Error::invalid_input("prompt must not be empty"));
        }

        let mut log = conversation.begin_turn().await?;
        log.append(prompt)?;
        info!(
            "Turn started on conversation {}: prompt of {} chars, {} messages in context",
            conversation.id(),
            prompt.chars().count(),
            log.len()
        );

        let generated = self.attempt(&log, policy).await.map_err(Error::Upstream)?;
        let text = generated.unwrap_or_else(|| {
            debug!("Upstream returned no text, using fallback");
            self.fallback_text.clone()
        });
        log.append(&text)?;

        info!(
            "Turn completed on conversation {}: {} messages, {}/{} chars",
            conversation.id(),
            log.len(),
            log.total_length(),
            log.max_total_length()
        );
        Ok(log.snapshot())
    }

    async fn attempt(
        &self,
        log: &MessageLog,
        policy: &RetryPolicy,
    ) -> logrelay_core::UpstreamResult<Option<String>> {
        let provider = &self.provider;
        retry_with_backoff(
            move |attempt| {
                let turns = encode(&log.snapshot());
                debug!("Attempt {attempt}: sending {} turns", turns.len());
                async move { provider.generate(&turns).await }
            },
            policy,
        )
        .await
    }
}
