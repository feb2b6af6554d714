//! Chat session — owns the conversation memory and drives one turn at a
//! time through the completion backend.
//!
//! The memory is committed only after a successful, non-empty reply: first
//! the user turn, then the assistant turn. A transport failure or an empty
//! reply leaves memory untouched, so the next attempt assembles the same
//! context. `run_turn` takes `&mut self`, which serializes turns — at most
//! one request is in flight per session and no internal locking is needed.

use std::sync::Arc;

use deepdesk_core::api::{ChatOutcome, CompletionApi};
use deepdesk_core::error::TransportError;
use deepdesk_core::message::{Message, Role};
use deepdesk_memory::ConversationMemory;
use tracing::{debug, error};

use crate::assembler::{build_request, merge_prompt, TurnSettings};

/// How one turn resolved, for the controller to present.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The assistant replied; memory gained the user and assistant turns.
    Reply(String),

    /// The backend answered but with no usable content. Memory unchanged.
    NoReply,

    /// The request failed at the transport level. Memory unchanged.
    Failed(TransportError),
}

impl TurnOutcome {
    /// Whether this turn was committed to memory. Inputs that were consumed
    /// by the turn (the user text, staged attachments) should only be
    /// discarded when this is true.
    pub fn committed(&self) -> bool {
        matches!(self, Self::Reply(_))
    }
}

/// A single interactive chat session.
pub struct ChatSession {
    memory: ConversationMemory,
    backend: Arc<dyn CompletionApi>,
}

impl ChatSession {
    /// Create a session around a backend, with the given context bound.
    pub fn new(backend: Arc<dyn CompletionApi>, max_context_messages: usize) -> Self {
        Self {
            memory: ConversationMemory::new(max_context_messages),
            backend,
        }
    }

    /// Run one turn: assemble, send, and commit on success.
    pub async fn run_turn(
        &mut self,
        user_text: &str,
        attachment_text: &str,
        settings: &TurnSettings,
    ) -> TurnOutcome {
        let request = build_request(user_text, attachment_text, settings, &self.memory);

        match self.backend.send(request).await {
            Ok(ChatOutcome::Reply(reply)) => {
                // Commit order matters: user turn first, then assistant.
                let full_prompt = merge_prompt(user_text, attachment_text);
                self.memory.append(Role::User, full_prompt);
                self.memory.append(Role::Assistant, reply.clone());
                debug!(context_len = self.memory.context_len(), "Turn committed");
                TurnOutcome::Reply(reply)
            }
            Ok(ChatOutcome::NoContent) => TurnOutcome::NoReply,
            Err(err) => {
                error!("Turn failed: {err}");
                TurnOutcome::Failed(err)
            }
        }
    }

    /// The full transcript, for rendering.
    pub fn transcript(&self) -> &[Message] {
        self.memory.display()
    }

    /// Reset the conversation.
    pub fn clear(&mut self) {
        self.memory.clear();
    }

    /// Read access to the underlying memory (for status display).
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }
}
