use std::time::Duration;

use async_trait::async_trait;
use logrelay_core::{Role, Turn, UpstreamClient, UpstreamError, UpstreamResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Wire names for each protocol role.
///
/// The upstream only knows two roles, so the context turn is sent as a
/// requester turn by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleNames {
    pub context: String,
    pub requester: String,
    pub responder: String,
}

impl Default for RoleNames {
    fn default() -> Self {
        Self {
            context: "user".to_string(),
            requester: "user".to_string(),
            responder: "model".to_string(),
        }
    }
}

impl RoleNames {
    #[must_use]
    pub fn name(&self, role: Role) -> &str {
        match role {
            Role::Context => &self.context,
            Role::Requester => &self.requester,
            Role::Responder => &self.responder,
        }
    }
}

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    roles: RoleNames,
    timeout: Option<Duration>,
    unknown_error: String,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating GeminiProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            roles: RoleNames::default(),
            timeout: None,
            unknown_error: DEFAULT_UNKNOWN_ERROR.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: RoleNames) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Message used when a failed response carries no `error.message`.
    #[must_use]
    pub fn with_unknown_error(mut self, message: String) -> Self {
        self.unknown_error = message;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the `generateContent` body, one `contents` entry per turn.
    #[must_use]
    pub fn build_request(&self, turns: &[Turn]) -> Value {
        let contents: Vec<Value> = turns
            .iter()
            .map(|turn| {
                json!({
                    "role": self.roles.name(turn.role),
                    "parts": [{ "text": turn.content }],
                })
            })
            .collect();
        json!({ "contents": contents })
    }

    /// Helper method to send a single request
    async fn try_send(&self, request: &Value) -> UpstreamResult<Option<String>> {
        let mut builder = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // The error body is optional; an unreadable one falls back to the generic message.
            let body = response.json::<Value>().await.ok();
            let message = body
                .as_ref()
                .and_then(error_message)
                .map_or_else(|| self.unknown_error.clone(), str::to_string);
            return Err(UpstreamError::new(Some(status.as_u16()), message));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::transport(format!("malformed response body: {e}")))?;

        Ok(generated_text(&body).map(str::to_string))
    }
}

/// Text of the first part of the first candidate, if present and non-empty.
#[must_use]
pub fn generated_text(response: &Value) -> Option<&str> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .filter(|text| !text.is_empty())
}

/// Nested `error.message` of a failed response, if present.
#[must_use]
pub fn error_message(response: &Value) -> Option<&str> {
    response["error"]["message"].as_str()
}

#[async_trait]
impl UpstreamClient for GeminiProvider {
    async fn generate(&self, turns: &[Turn]) -> UpstreamResult<Option<String>> {
        let request = self.build_request(turns);

        info!(
            "Sending request to Gemini API: model={}, turns={}",
            self.model,
            turns.len()
        );
        debug!("Request body: {request}");

        let text = self.try_send(&request).await?;

        info!("Received response from Gemini API");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
