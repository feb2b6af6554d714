//! # DeepDesk Core
//!
//! Domain types, traits, and error definitions for the DeepDesk chat client.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The completion backend is defined as a trait here; the concrete HTTP
//! client lives in its own crate. This enables:
//! - Swapping backends via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod api;
pub mod error;
pub mod message;

// Re-export key types at crate root for ergonomics
pub use api::{ChatOutcome, ChatRequest, CompletionApi};
pub use error::{AttachmentError, TransportError};
pub use message::{Message, Role};
