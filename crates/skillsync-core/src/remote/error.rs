//! Remote service error types.

/// Errors produced by calls to the remote developer-console service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("service response has no {0} header")]
    MissingHeader(&'static str),

    #[error("export finished without a package location")]
    MissingLocation,

    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    /// Whether retrying the same call may succeed.
    ///
    /// Network failures, throttling and server-side errors are transient;
    /// client errors and undecodable payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Transport(e) => !e.is_decode() && !e.is_builder(),
            RemoteError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
