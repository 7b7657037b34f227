//! Deploy supervisor failures.
//!
//! Gate rejections are not errors; they come back as
//! [`super::DeployOutcome::Rejected`].

use crate::build::PollError;
use crate::git::RepoError;
use crate::remote::RemoteError;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("remote service call failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("repository operation failed: {0}")]
    Repository(#[from] RepoError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("skill package operation failed: {0:#}")]
    Package(#[source] anyhow::Error),

    #[error("project state update failed: {0:#}")]
    State(#[source] anyhow::Error),

    #[error("no commit found after push")]
    MissingCommit,

    /// A push deploy was chosen for a supervisor built without a repository.
    #[error("push deploy requires a repository")]
    NoRepository,
}

impl DeployError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeployError::Poll(PollError::Cancelled))
    }
}
