//! Classifier and gate properties over exhaustive state combinations.

use skillsync_core::git::{ChangeKind, DiffEntry};
use skillsync_core::sync::{
    CodeSyncState, DeployDecision, DeployMechanism, LocalChangeState, PackageSyncState,
    classify_local_changes, classify_package_sync, decide,
};
use skillsync_core::types::Stage;

fn all_local() -> Vec<LocalChangeState> {
    vec![
        LocalChangeState::Untracked,
        LocalChangeState::Unstaged,
        LocalChangeState::Staged,
        LocalChangeState::Committed,
        LocalChangeState::NoChanges,
        LocalChangeState::InvalidBranch {
            branch: Some("feature".to_string()),
            allowed: vec!["dev".to_string(), "master".to_string()],
        },
        LocalChangeState::ChangesExist,
    ]
}

fn all_package() -> Vec<PackageSyncState> {
    vec![
        PackageSyncState::UpToDate,
        PackageSyncState::OutOfSync,
        PackageSyncState::NoETag,
        PackageSyncState::LiveSkill,
        PackageSyncState::NoSkillPackage,
        PackageSyncState::ServiceError {
            message: "HTTP 503".to_string(),
        },
    ]
}

fn all_code() -> Vec<Option<CodeSyncState>> {
    vec![
        None,
        Some(CodeSyncState::UpToDate),
        Some(CodeSyncState::OutOfSync),
        Some(CodeSyncState::Ahead),
        Some(CodeSyncState::Diverged),
        Some(CodeSyncState::NoSkillCode),
        Some(CodeSyncState::ServiceError {
            message: "offline".to_string(),
        }),
    ]
}

fn every_input() -> Vec<(LocalChangeState, PackageSyncState, Option<CodeSyncState>, bool)> {
    let mut inputs = Vec::new();
    for local in all_local() {
        for package in all_package() {
            for code in all_code() {
                for forced in [false, true] {
                    inputs.push((local.clone(), package.clone(), code.clone(), forced));
                }
            }
        }
    }
    inputs
}

fn branches() -> Vec<String> {
    vec!["dev".to_string(), "master".to_string()]
}

fn entries(n: usize) -> Vec<DiffEntry> {
    (0..n)
        .map(|i| DiffEntry::new(format!("file-{i}"), ChangeKind::Modified))
        .collect()
}

#[test]
fn local_classifier_follows_priority_order() {
    let branch_options = [Some("dev"), Some("feature"), None];
    for branch in branch_options {
        for diff in [0, 2] {
            for staged in [0, 1] {
                for ahead in [0, 3] {
                    for work_tree in [0, 4] {
                        let state = classify_local_changes(
                            branch,
                            &branches(),
                            &entries(diff),
                            &entries(staged),
                            ahead,
                            work_tree,
                        );
                        let expected = if branch != Some("dev") {
                            "invalidBranch"
                        } else if diff > 0 {
                            "unstaged"
                        } else if staged > 0 {
                            "staged"
                        } else if ahead > 0 {
                            "committed"
                        } else if work_tree > 0 {
                            "untracked"
                        } else {
                            "noChanges"
                        };
                        let actual = serde_json::to_value(&state).expect("serialize state");
                        assert_eq!(actual["state"], expected, "{branch:?} {diff} {staged} {ahead} {work_tree}");
                        assert_eq!(state.is_valid(), expected == "committed");
                    }
                }
            }
        }
    }
}

#[test]
fn package_classifier_is_reflexive() {
    for tag in ["a", "W/\"123\"", "etag-with-dashes", "0"] {
        assert_eq!(
            classify_package_sync(Some(tag), Ok(Some(tag)), true, Stage::Development),
            PackageSyncState::UpToDate
        );
    }
}

#[test]
fn package_classifier_detects_remote_changes() {
    let pairs = [("a", "b"), ("etag-1", "etag-2"), ("x", "X")];
    for stage in [Stage::Development, Stage::Certification] {
        for (local, remote) in pairs {
            assert_eq!(
                classify_package_sync(Some(local), Ok(Some(remote)), true, stage),
                PackageSyncState::OutOfSync
            );
        }
    }
}

#[test]
fn gate_is_idempotent() {
    for (local, package, code, forced) in every_input() {
        let first = decide(&local, &package, code.as_ref(), forced);
        let second = decide(&local, &package, code.as_ref(), forced);
        assert_eq!(first, second);
    }
}

#[test]
fn force_never_overrides_correctness_hazards() {
    for (local, package, code, _) in every_input() {
        let hazard = package == PackageSyncState::LiveSkill
            || package == PackageSyncState::NoSkillPackage
            || matches!(package, PackageSyncState::ServiceError { .. })
            || matches!(local, LocalChangeState::InvalidBranch { .. })
            || code.as_ref().is_some_and(|c| !c.is_valid());
        if hazard {
            let decision = decide(&local, &package, code.as_ref(), true);
            assert!(
                !decision.is_proceed(),
                "{local:?} {package:?} {code:?} proceeded when forced"
            );
        }
    }
}

#[test]
fn proceeding_requires_valid_or_forceable_states() {
    for (local, package, code, forced) in every_input() {
        if !decide(&local, &package, code.as_ref(), forced).is_proceed() {
            continue;
        }
        assert!(local.is_valid() || forced);
        assert!(package.is_valid() || (forced && package.is_stale_only()));
        if let Some(code) = &code {
            assert!(matches!(code, CodeSyncState::UpToDate | CodeSyncState::Ahead));
        }
    }
}

#[test]
fn rejection_reason_comes_from_first_failing_dimension() {
    let decision = decide(
        &LocalChangeState::Staged,
        &PackageSyncState::LiveSkill,
        Some(&CodeSyncState::Diverged),
        false,
    );
    assert_eq!(
        decision,
        DeployDecision::Reject {
            reason: LocalChangeState::Staged.text()
        }
    );

    let decision = decide(
        &LocalChangeState::Committed,
        &PackageSyncState::UpToDate,
        Some(&CodeSyncState::Diverged),
        true,
    );
    assert_eq!(
        decision,
        DeployDecision::Reject {
            reason: CodeSyncState::Diverged.text()
        }
    );
}

#[test]
fn committed_and_up_to_date_pushes() {
    let decision = decide(
        &LocalChangeState::Committed,
        &PackageSyncState::UpToDate,
        Some(&CodeSyncState::UpToDate),
        false,
    );
    assert_eq!(
        decision,
        DeployDecision::Proceed {
            mechanism: DeployMechanism::Push
        }
    );
}

#[test]
fn no_changes_is_rejected_with_its_own_text() {
    for code in [None, Some(CodeSyncState::UpToDate)] {
        let decision = decide(
            &LocalChangeState::NoChanges,
            &PackageSyncState::UpToDate,
            code.as_ref(),
            false,
        );
        assert_eq!(
            decision,
            DeployDecision::Reject {
                reason: LocalChangeState::NoChanges.text()
            }
        );
    }
}

#[test]
fn forced_unstaged_out_of_sync_uploads() {
    let decision = decide(
        &LocalChangeState::Unstaged,
        &PackageSyncState::OutOfSync,
        Some(&CodeSyncState::UpToDate),
        true,
    );
    assert_eq!(
        decision,
        DeployDecision::Proceed {
            mechanism: DeployMechanism::Upload
        }
    );
}

#[test]
fn live_skill_always_rejects() {
    for local in all_local() {
        for code in all_code() {
            for forced in [false, true] {
                let decision = decide(&local, &PackageSyncState::LiveSkill, code.as_ref(), forced);
                assert!(!decision.is_proceed());
            }
        }
    }
}
