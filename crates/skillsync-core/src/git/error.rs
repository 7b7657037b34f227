//! Repository error types.

/// Errors produced by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("git command failed {args:?}: {stderr}")]
    Command { args: Vec<String>, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("repository has no commits")]
    NoHead,

    #[error("repository task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
