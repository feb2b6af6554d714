//! Error types for the DeepDesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own error type, carried explicitly by the operations that can
//! produce it; none of them should ever terminate the session loop — every
//! failure path is a value handed back to the controller.

use thiserror::Error;

/// Failures of the HTTP round trip to the completion endpoint.
///
/// Surfaced to the user as a visible error message; conversation memory is
/// left unmodified when any of these occur.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Per-file ingestion failures — recovered locally, reported as warnings,
/// and never abort the rest of the batch.
#[derive(Debug, Clone, Error)]
pub enum AttachmentError {
    #[error("Could not read {name}: {reason}")]
    Unreadable { name: String, reason: String },

    #[error("Could not parse PDF {name}: {reason}")]
    PdfParse { name: String, reason: String },
}

impl AttachmentError {
    /// The source file name this failure refers to.
    pub fn file_name(&self) -> &str {
        match self {
            Self::Unreadable { name, .. } | Self::PdfParse { name, .. } => name,
        }
    }
}
