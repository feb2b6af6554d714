//! Completion client implementations for DeepDesk.

pub mod deepseek;

pub use deepseek::DeepSeekClient;
