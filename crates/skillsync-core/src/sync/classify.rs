//! Pure classifiers mapping raw repository and remote signals to sync states.

use crate::git::DiffEntry;
use crate::types::Stage;

use super::{CodeSyncState, LocalChangeState, PackageSyncState};

/// Classify local changes for the version-control flow.
///
/// First matching rule wins: branch not deployable, unstaged diff, staged
/// diff, unpushed commits, untracked files, nothing.
pub fn classify_local_changes(
    branch: Option<&str>,
    deployable_branches: &[String],
    diff_with_head: &[DiffEntry],
    diff_index_with_head: &[DiffEntry],
    head_ahead: usize,
    work_tree_change_count: usize,
) -> LocalChangeState {
    let deployable = branch.is_some_and(|b| deployable_branches.iter().any(|d| d == b));
    if !deployable {
        return LocalChangeState::InvalidBranch {
            branch: branch.map(str::to_string),
            allowed: deployable_branches.to_vec(),
        };
    }
    if !diff_with_head.is_empty() {
        return LocalChangeState::Unstaged;
    }
    if !diff_index_with_head.is_empty() {
        return LocalChangeState::Staged;
    }
    if head_ahead != 0 {
        return LocalChangeState::Committed;
    }
    if work_tree_change_count != 0 {
        return LocalChangeState::Untracked;
    }
    LocalChangeState::NoChanges
}

/// Classify local changes for the digest-based flow.
///
/// A missing last digest means the package was never deployed from here.
pub fn classify_local_digest(current: &str, last_deployed: Option<&str>) -> LocalChangeState {
    match last_deployed {
        Some(last) if last == current => LocalChangeState::NoChanges,
        _ => LocalChangeState::ChangesExist,
    }
}

/// Classify the remote package against the locally recorded ETag.
///
/// `remote` is the remote ETag read, or the text of the error that read
/// failed with. It is ignored when the package directory is missing or the
/// stage is live.
pub fn classify_package_sync(
    local_etag: Option<&str>,
    remote: Result<Option<&str>, &str>,
    package_exists: bool,
    stage: Stage,
) -> PackageSyncState {
    if !package_exists {
        return PackageSyncState::NoSkillPackage;
    }
    if stage.is_live() {
        return PackageSyncState::LiveSkill;
    }
    let remote = match remote {
        Ok(remote) => remote,
        Err(message) => {
            return PackageSyncState::ServiceError {
                message: message.to_string(),
            };
        }
    };
    match local_etag.filter(|e| !e.is_empty()) {
        None => PackageSyncState::NoETag,
        Some(local) if remote == Some(local) => PackageSyncState::UpToDate,
        Some(_) => PackageSyncState::OutOfSync,
    }
}

/// Classify the code branch against its upstream after a fetch.
pub fn classify_code_sync(
    code_exists: bool,
    ahead: usize,
    behind: usize,
    fetch_error: Option<&str>,
) -> CodeSyncState {
    if !code_exists {
        return CodeSyncState::NoSkillCode;
    }
    if let Some(message) = fetch_error {
        return CodeSyncState::ServiceError {
            message: message.to_string(),
        };
    }
    match (ahead != 0, behind != 0) {
        (true, true) => CodeSyncState::Diverged,
        (true, false) => CodeSyncState::Ahead,
        (false, true) => CodeSyncState::OutOfSync,
        (false, false) => CodeSyncState::UpToDate,
    }
}
