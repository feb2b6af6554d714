//! Conversation memory — the ordered, size-bounded log of a chat session.
//!
//! Two parallel views of the same conversation:
//!
//! - the **display log** keeps every message ever appended, for rendering
//!   the full transcript to the user;
//! - the **context log** is the bounded trailing window actually sent to
//!   the API, evicted FIFO once it exceeds `max_messages`.
//!
//! The memory is owned exclusively by the active session: created at
//! session start, dropped at session end, no ambient state. Only `append`
//! and `clear` mutate it; `context_for` is read-only.

use deepdesk_core::message::{Message, Role};
use std::collections::VecDeque;
use tracing::debug;

/// Default bound for the context window.
pub const DEFAULT_MAX_CONTEXT_MESSAGES: usize = 8;

/// How many characters of an evicted message the diagnostic log shows.
const EVICTION_PREVIEW_CHARS: usize = 50;

/// An ordered, size-bounded log of role-tagged messages.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    /// Everything ever appended, for display.
    display: Vec<Message>,

    /// The bounded trailing window used for API requests.
    context: VecDeque<Message>,

    /// Context bound, fixed at construction for the session lifetime.
    max_messages: usize,
}

impl ConversationMemory {
    /// Create a memory with the given context bound.
    pub fn new(max_messages: usize) -> Self {
        Self {
            display: Vec::new(),
            context: VecDeque::new(),
            max_messages,
        }
    }

    /// The configured context bound.
    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Append a message to both the display log and the context log.
    ///
    /// If the context log now exceeds the bound, the oldest entries are
    /// evicted until it holds exactly `max_messages`. Each eviction is a
    /// diagnostic event, not an error.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        let message = Message::new(role, content);
        self.display.push(message.clone());
        self.context.push_back(message);

        while self.context.len() > self.max_messages {
            if let Some(evicted) = self.context.pop_front() {
                let preview: String =
                    evicted.content.chars().take(EVICTION_PREVIEW_CHARS).collect();
                debug!(role = evicted.role.as_str(), "Evicting message: {preview}...");
            }
        }
    }

    /// Build the context slice for a request: one system message followed
    /// by the last `max_messages` entries of the context log.
    ///
    /// Returns a fresh sequence; never mutates the log. With
    /// `max_messages == 0` this is just the system message.
    pub fn context_for(&self, system_prompt: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.context.len() + 1);
        messages.push(Message::system(system_prompt));
        messages.extend(self.context.iter().cloned());
        messages
    }

    /// The full transcript, oldest first.
    pub fn display(&self) -> &[Message] {
        &self.display
    }

    /// Number of messages currently in the context window.
    pub fn context_len(&self) -> usize {
        self.context.len()
    }

    /// Reset both logs to empty. Idempotent.
    pub fn clear(&mut self) {
        self.display.clear();
        self.context.clear();
    }

    /// Whether nothing has been appended (or everything was cleared).
    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_MESSAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_both_logs() {
        let mut mem = ConversationMemory::default();
        mem.append(Role::User, "hello");
        mem.append(Role::Assistant, "hi");

        assert_eq!(mem.display().len(), 2);
        assert_eq!(mem.context_len(), 2);
        assert_eq!(mem.display()[0].content, "hello");
        assert_eq!(mem.display()[1].role, Role::Assistant);
    }

    #[test]
    fn context_never_exceeds_bound() {
        let mut mem = ConversationMemory::new(3);
        for i in 0..10 {
            mem.append(Role::User, format!("message {i}"));
            assert!(mem.context_len() <= 3);
        }
        assert_eq!(mem.context_len(), 3);
    }

    #[test]
    fn display_log_keeps_everything() {
        let mut mem = ConversationMemory::new(2);
        for i in 0..7 {
            mem.append(Role::User, format!("message {i}"));
        }
        assert_eq!(mem.display().len(), 7);
        assert_eq!(mem.context_len(), 2);
    }

    #[test]
    fn eviction_is_fifo() {
        let mut mem = ConversationMemory::new(3);
        for i in 0..5 {
            mem.append(Role::User, format!("message {i}"));
        }

        // Oldest two were evicted; the window holds 2, 3, 4 in order.
        let ctx = mem.context_for("sys");
        let contents: Vec<&str> = ctx[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn context_for_starts_with_one_system_message() {
        let mem = ConversationMemory::default();
        let ctx = mem.context_for("Be concise");
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx[0].role, Role::System);
        assert_eq!(ctx[0].content, "Be concise");
    }

    #[test]
    fn context_for_does_not_mutate() {
        let mut mem = ConversationMemory::default();
        mem.append(Role::User, "hello");

        let before = mem.context_len();
        let _ = mem.context_for("sys");
        let _ = mem.context_for("sys");
        assert_eq!(mem.context_len(), before);
        assert_eq!(mem.display().len(), 1);
    }

    #[test]
    fn zero_bound_yields_system_message_only() {
        let mut mem = ConversationMemory::new(0);
        mem.append(Role::User, "hello");
        mem.append(Role::Assistant, "hi");

        let ctx = mem.context_for("sys");
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx[0].role, Role::System);
        // Display still retains everything
        assert_eq!(mem.display().len(), 2);
    }

    #[test]
    fn clear_resets_both_logs() {
        let mut mem = ConversationMemory::default();
        mem.append(Role::User, "hello");
        mem.append(Role::Assistant, "hi");

        mem.clear();
        assert!(mem.is_empty());
        assert_eq!(mem.context_len(), 0);

        let ctx = mem.context_for("sys");
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx[0].content, "sys");

        // Idempotent
        mem.clear();
        assert!(mem.is_empty());
    }

    #[test]
    fn ten_pairs_window_of_eight() {
        let mut mem = ConversationMemory::new(8);
        for i in 0..10 {
            mem.append(Role::User, format!("question {i}"));
            mem.append(Role::Assistant, format!("answer {i}"));
        }

        assert_eq!(mem.display().len(), 20);
        assert_eq!(mem.context_len(), 8);

        // The window holds the 8 most recent: question/answer 6..=9
        let ctx = mem.context_for("sys");
        assert_eq!(ctx.len(), 9);
        assert_eq!(ctx[1].content, "question 6");
        assert_eq!(ctx[8].content, "answer 9");
    }

    #[test]
    fn chronological_order_preserved_in_context() {
        let mut mem = ConversationMemory::new(4);
        mem.append(Role::User, "a");
        mem.append(Role::Assistant, "b");
        mem.append(Role::User, "c");

        let ctx = mem.context_for("sys");
        let roles: Vec<Role> = ctx.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
    }
}
