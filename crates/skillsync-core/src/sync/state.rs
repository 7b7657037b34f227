//! Named sync states.
//!
//! Each state carries the explanation shown to the user and whether a
//! normal (unforced) deploy may proceed from it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of local changes relative to the last deploy.
///
/// `Untracked` to `InvalidBranch` apply to the version-control flow;
/// `ChangesExist` (with `NoChanges`) to the digest-based flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LocalChangeState {
    Untracked,
    Unstaged,
    Staged,
    Committed,
    NoChanges,
    InvalidBranch {
        /// `None` when HEAD is detached.
        branch: Option<String>,
        allowed: Vec<String>,
    },
    ChangesExist,
}

impl LocalChangeState {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Committed | Self::ChangesExist)
    }

    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LocalChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untracked => f.write_str(
                "There are untracked files in the skill project. Add and commit them before deploying.",
            ),
            Self::Unstaged => f.write_str(
                "There are unstaged changes in the skill project. Stage and commit them before deploying.",
            ),
            Self::Staged => f.write_str(
                "There are staged changes that are not committed. Commit them before deploying.",
            ),
            Self::Committed => f.write_str("Local commits are ready to be deployed."),
            Self::NoChanges => f.write_str("No local changes found since the last deploy."),
            Self::InvalidBranch { branch, allowed } => {
                match branch {
                    Some(branch) => write!(f, "Branch '{}' cannot be deployed.", branch)?,
                    None => f.write_str("A detached HEAD cannot be deployed.")?,
                }
                write!(f, " Switch to one of: {}.", allowed.join(", "))
            }
            Self::ChangesExist => f.write_str("Local changes are ready to be deployed."),
        }
    }
}

/// State of the remote skill package relative to the last known ETag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PackageSyncState {
    UpToDate,
    OutOfSync,
    NoETag,
    LiveSkill,
    NoSkillPackage,
    ServiceError { message: String },
}

impl PackageSyncState {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::UpToDate)
    }

    /// Invalid states a forced deploy may ignore.
    pub fn is_stale_only(&self) -> bool {
        matches!(self, Self::OutOfSync | Self::NoETag)
    }

    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PackageSyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate => f.write_str("The skill package is up to date with the remote."),
            Self::OutOfSync => f.write_str(
                "The remote skill package changed since the last deploy. Export it or force the deploy.",
            ),
            Self::NoETag => f.write_str(
                "No version of the remote skill package is recorded for this profile. Export it or force the deploy.",
            ),
            Self::LiveSkill => f.write_str("Live skills cannot be deployed."),
            Self::NoSkillPackage => f.write_str("The skill package directory does not exist."),
            Self::ServiceError { message } => {
                write!(f, "Could not read the remote skill package status: {}", message)
            }
        }
    }
}

/// State of the skill code branch relative to its upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CodeSyncState {
    UpToDate,
    OutOfSync,
    Ahead,
    Diverged,
    NoSkillCode,
    ServiceError { message: String },
}

impl CodeSyncState {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::UpToDate | Self::Ahead)
    }

    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CodeSyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate => f.write_str("The skill code is up to date with the remote."),
            Self::OutOfSync => {
                f.write_str("The remote skill code has new commits. Pull them before deploying.")
            }
            Self::Ahead => f.write_str("Local skill code commits are ready to be pushed."),
            Self::Diverged => f.write_str(
                "Local and remote skill code have diverged. Reconcile the history before deploying.",
            ),
            Self::NoSkillCode => f.write_str("The skill code directory does not exist."),
            Self::ServiceError { message } => {
                write!(f, "Could not fetch the remote skill code: {}", message)
            }
        }
    }
}
