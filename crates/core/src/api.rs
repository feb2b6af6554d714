//! CompletionApi trait — the abstraction over the chat-completion backend.
//!
//! A backend knows how to send an assembled request to an LLM endpoint and
//! return either the assistant's reply or a typed failure. There is exactly
//! one production implementation (the DeepSeek HTTP client); tests use
//! scripted mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::message::Message;

/// An assembled chat-completion request.
///
/// Constructed fresh per turn by the assembler and never mutated after
/// construction. The client crate owns the mapping onto the wire JSON
/// (`{model, messages: [{role, content}], temperature}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model identifier (e.g. "deepseek-chat")
    pub model: String,

    /// System prompt + windowed context + current user turn, in order
    pub messages: Vec<Message>,

    /// Sampling temperature, always within [0.0, 1.0]
    pub temperature: f32,
}

/// What a 2xx response amounted to, as a named outcome.
///
/// A response either carries non-empty assistant content or it does not —
/// "choices was empty", "message.content was missing", and "content was an
/// empty string" are all the same `NoContent` outcome rather than an empty
/// string threaded through the call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The assistant replied with non-empty content.
    Reply(String),

    /// The response was well-formed transport-wise but had no usable
    /// content. Treated as a soft failure: no memory mutation.
    NoContent,
}

impl ChatOutcome {
    /// Classify extracted content: empty string collapses to `NoContent`.
    pub fn from_content(content: String) -> Self {
        if content.is_empty() {
            Self::NoContent
        } else {
            Self::Reply(content)
        }
    }
}

/// The completion backend seam.
///
/// One request in flight at a time per session; the session controller
/// serializes turns, so implementations need no internal locking beyond
/// what the HTTP client already provides.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// A human-readable name for this backend (e.g. "deepseek").
    fn name(&self) -> &str;

    /// Send an assembled request and wait for the outcome.
    ///
    /// Transport-level failures (connect errors, timeouts, non-2xx) come
    /// back as `TransportError` values — never as panics.
    async fn send(&self, request: ChatRequest) -> std::result::Result<ChatOutcome, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_collapses_to_no_content() {
        assert_eq!(ChatOutcome::from_content(String::new()), ChatOutcome::NoContent);
        assert_eq!(
            ChatOutcome::from_content("Hi".into()),
            ChatOutcome::Reply("Hi".into())
        );
    }

    #[test]
    fn request_serialization_has_wire_fields() {
        let req = ChatRequest {
            model: "deepseek-chat".into(),
            messages: vec![Message::system("rules"), Message::user("hello")],
            temperature: 0.7,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["role"], "system");
    }
}
