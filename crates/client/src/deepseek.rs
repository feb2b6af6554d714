//! DeepSeek chat-completion client.
//!
//! Speaks the OpenAI-style `/chat/completions` wire format: a JSON body
//! `{model, messages, temperature}` with bearer authorization, answered by
//! a JSON object whose `choices[0].message.content` carries the reply.
//!
//! Every failure is a typed value. Transport problems (connect errors,
//! timeouts, non-2xx statuses) come back as `TransportError`; a 2xx body
//! that is missing the expected fields is the named `NoContent` outcome,
//! never a panic and never a silently threaded empty string.

use async_trait::async_trait;
use deepdesk_core::api::{ChatOutcome, ChatRequest, CompletionApi};
use deepdesk_core::error::TransportError;
use deepdesk_core::message::Message;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Default request timeout.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// The DeepSeek completion client.
pub struct DeepSeekClient {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl DeepSeekClient {
    /// Create a client for the given endpoint and credential.
    ///
    /// The credential is assumed valid: missing-key cases are gated
    /// upstream by the controller before any turn runs.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Convert our Message types to the wire format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Pull the first choice's content out of a parsed response body.
    fn extract_content(response: ApiResponse) -> ChatOutcome {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();
        ChatOutcome::from_content(content)
    }
}

#[async_trait]
impl CompletionApi for DeepSeekClient {
    fn name(&self) -> &str {
        "deepseek"
    }

    async fn send(&self, request: ChatRequest) -> Result<ChatOutcome, TransportError> {
        let body = ApiRequest {
            model: request.model.clone(),
            messages: Self::to_api_messages(&request.messages),
            temperature: request.temperature,
        };

        info!(
            model = %request.model,
            count = body.messages.len(),
            "Sending {} messages to DeepSeek API",
            body.messages.len()
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("API request failed: {e}");
                if e.is_timeout() {
                    TransportError::Timeout(e.to_string())
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(TransportError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "API returned non-2xx status");
            return Err(TransportError::Api {
                status_code: status,
                message: error_body,
            });
        }

        // A 2xx body that fails to parse or lacks the expected fields is a
        // soft failure, not a transport error: the named NoContent outcome.
        match response.json::<ApiResponse>().await {
            Ok(parsed) => {
                let outcome = Self::extract_content(parsed);
                if outcome == ChatOutcome::NoContent {
                    warn!("API response carried no usable content");
                } else {
                    debug!("Received assistant reply");
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!("Malformed API response body: {e}");
                Ok(ChatOutcome::NoContent)
            }
        }
    }
}

// --- Wire types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    message: Option<ApiChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
