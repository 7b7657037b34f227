//! Deploy gate: turn classified states plus intent into one decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CodeSyncState, LocalChangeState, PackageSyncState};

/// How an approved deploy reaches the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMechanism {
    /// Push commits and let the backend build from them.
    Push,
    /// Upload the packed skill package directly.
    Upload,
}

impl fmt::Display for DeployMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployMechanism::Push => f.write_str("push"),
            DeployMechanism::Upload => f.write_str("upload"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum DeployDecision {
    Proceed { mechanism: DeployMechanism },
    Reject { reason: String },
}

impl DeployDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, DeployDecision::Proceed { .. })
    }

    fn reject(reason: String) -> Self {
        DeployDecision::Reject { reason }
    }
}

/// Decide whether a deploy may proceed and by which mechanism.
///
/// `code` is `None` for the digest-based flow, which always uploads.
/// Forcing waives stale local and package states only; a non-deployable
/// branch, a live stage, a missing package and every invalid code state
/// still reject.
pub fn decide(
    local: &LocalChangeState,
    package: &PackageSyncState,
    code: Option<&CodeSyncState>,
    forced: bool,
) -> DeployDecision {
    let local_waived = forced && !matches!(local, LocalChangeState::InvalidBranch { .. });
    if !local.is_valid() && !local_waived {
        return DeployDecision::reject(local.text());
    }

    let package_waived = forced && package.is_stale_only();
    if !package.is_valid() && !package_waived {
        return DeployDecision::reject(package.text());
    }

    let Some(code) = code else {
        return DeployDecision::Proceed {
            mechanism: DeployMechanism::Upload,
        };
    };

    if !code.is_valid() {
        return DeployDecision::reject(code.text());
    }

    let mechanism = if forced && *code == CodeSyncState::UpToDate {
        DeployMechanism::Upload
    } else {
        DeployMechanism::Push
    };
    DeployDecision::Proceed { mechanism }
}
