//! Unified error type for the labs workspace.

use crate::LoginStep;
use std::time::Duration;
use thiserror::Error;

/// Enumerates all error kinds that can occur across labs crates.
#[derive(Debug, Error)]
pub enum LabsError {
    /// An expected redirect header or query parameter was absent during login.
    ///
    /// Signals a changed or broken identity-provider flow; the attempt is over.
    #[error("login protocol error at {step}: {reason}")]
    Protocol {
        step: LoginStep,
        reason: &'static str,
    },

    /// The generation service rejected the prompt.
    #[error("prompt rejected: {0}")]
    PromptRejected(String),

    /// The server reported success without the payload it promised.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(String),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A JSON endpoint returned a non-success status.
    #[error("upstream error: status={status}, body={body}")]
    Upstream { status: u16, body: String },

    /// Configuration loading or URL construction error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Polling was cancelled by the caller.
    #[error("task polling cancelled")]
    Cancelled,

    /// The optional poll timeout elapsed before a terminal status.
    #[error("task did not finish within {0:?}")]
    Timeout(Duration),
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for LabsError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl LabsError {
    /// Shorthand for a [`LabsError::Protocol`] at the given step.
    #[must_use]
    pub fn protocol(step: LoginStep, reason: &'static str) -> Self {
        Self::Protocol { step, reason }
    }

    /// Returns the login step this error was raised at, if any.
    #[must_use]
    pub fn login_step(&self) -> Option<LoginStep> {
        match self {
            Self::Protocol { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, LabsError>;
