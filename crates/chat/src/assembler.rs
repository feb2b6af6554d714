//! Request assembly — combines the system prompt, the trimmed history
//! window, and the current user turn into one completion request.
//!
//! Assembly is pure with respect to memory: the turn is only committed to
//! the log after a successful response (see `session`), so a failed request
//! leaves memory exactly as it was.

use deepdesk_core::api::ChatRequest;
use deepdesk_core::message::Message;
use deepdesk_memory::ConversationMemory;
use tracing::warn;

/// Per-turn request settings supplied by the session controller.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Model identifier sent on the wire.
    pub model: String,
    /// System prompt prepended to every request.
    pub system_prompt: String,
    /// Sampling temperature; values outside [0.0, 1.0] are clamped.
    pub temperature: f32,
}

/// Build a completion request for one turn.
///
/// The attachment text, when present, is appended to the user text on a
/// new line; the result becomes the current user message after the
/// system prompt and the windowed context. Never mutates `memory`.
pub fn build_request(
    user_text: &str,
    attachment_text: &str,
    settings: &TurnSettings,
    memory: &ConversationMemory,
) -> ChatRequest {
    let full_prompt = merge_prompt(user_text, attachment_text);

    let mut messages = memory.context_for(&settings.system_prompt);
    messages.push(Message::user(full_prompt));

    ChatRequest {
        model: settings.model.clone(),
        messages,
        temperature: clamp_temperature(settings.temperature),
    }
}

/// The prompt for the current turn: user text alone, or user text with the
/// attachment block appended on a new line.
pub fn merge_prompt(user_text: &str, attachment_text: &str) -> String {
    if attachment_text.is_empty() {
        user_text.to_string()
    } else {
        format!("{user_text}\n{attachment_text}")
    }
}

fn clamp_temperature(temperature: f32) -> f32 {
    if !(0.0..=1.0).contains(&temperature) {
        let clamped = temperature.clamp(0.0, 1.0);
        warn!(requested = temperature, used = clamped, "Temperature out of range, clamping");
        clamped
    } else {
        temperature
    }
}
