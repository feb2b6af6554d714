//! Request assembly and session orchestration for DeepDesk.

pub mod assembler;
pub mod session;

pub use assembler::{build_request, TurnSettings};
pub use session::{ChatSession, TurnOutcome};
