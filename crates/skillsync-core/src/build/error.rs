//! Terminal build polling failures.

use crate::remote::RemoteError;

use super::StatusKey;

/// Errors that end a poll loop.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The backend reported a failed build stage.
    #[error("{stage} failed: {}", failure_text(.message))]
    Build { stage: StatusKey, message: String },

    /// None of the tracked stages ever appeared.
    #[error("internal error with the service")]
    Internal,

    #[error("build timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },

    #[error("build polling cancelled")]
    Cancelled,

    #[error("failed to read build status: {0}")]
    Remote(#[from] RemoteError),
}

fn failure_text(message: &str) -> &str {
    if message.trim().is_empty() {
        "no error details reported"
    } else {
        message
    }
}
