//! End-to-end deploy, check and export for one skill.
//!
//! The supervisor reads local and remote signals, asks the gate for a
//! decision, drives the chosen mechanism through the build poller and is
//! the only writer of [`VersionMarkers`]. Markers are committed once, after
//! the poller reports success; any failure or cancellation before that point
//! leaves the project-state file untouched.
//!
//! One deploy per skill at a time is assumed. Callers serialize concurrent
//! deploys of the same skill.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::build::{BuildPoller, BuildStatusSnapshot, PollPlan, RetryPolicy};
use crate::config::{GitSettings, ProjectSettings};
use crate::fs::{DigestService, Packager};
use crate::git::RepositoryFacade;
use crate::remote::{JobRef, RemoteError, RemoteStateClient};
use crate::sync::{
    CodeSyncState, DeployDecision, DeployMechanism, LocalChangeState, PackageSyncState,
    classify_code_sync, classify_local_changes, classify_local_digest, classify_package_sync,
    decide,
};
use crate::types::SkillTarget;

use super::{DeployError, ProjectStateStore, VersionMarkers};

/// Where the skill package and code live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub package_dir: PathBuf,
    pub code_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, settings: &ProjectSettings) -> Self {
        let root = root.into();
        Self {
            package_dir: root.join(&settings.package_dir),
            code_dir: root.join(&settings.code_dir),
            root,
        }
    }
}

/// Every classified state plus the gate decision, without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub local: LocalChangeState,
    pub package: PackageSyncState,
    /// `None` for the digest-based flow.
    pub code: Option<CodeSyncState>,
    pub decision: DeployDecision,
    #[serde(skip)]
    pub markers: Option<VersionMarkers>,
    /// Local package digest, computed for the digest-based flow only.
    #[serde(skip)]
    pub digest: Option<String>,
}

#[derive(Debug)]
pub enum DeployOutcome {
    Rejected {
        reason: String,
        report: SyncReport,
    },
    Deployed {
        mechanism: DeployMechanism,
        snapshot: BuildStatusSnapshot,
        markers: VersionMarkers,
    },
}

#[derive(Debug)]
pub struct ExportOutcome {
    pub snapshot: BuildStatusSnapshot,
    pub markers: VersionMarkers,
}

/// Version-control collaborators for the hosted flow.
struct HostedRepo<'a> {
    repo: &'a dyn RepositoryFacade,
    git: GitSettings,
}

pub struct DeploymentSupervisor<'a> {
    remote: &'a dyn RemoteStateClient,
    digest: &'a dyn DigestService,
    packager: &'a dyn Packager,
    hosted: Option<HostedRepo<'a>>,
    state: ProjectStateStore,
    layout: ProjectLayout,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl<'a> DeploymentSupervisor<'a> {
    /// Supervisor for the digest-based flow. Add a repository with
    /// [`Self::with_repository`] to switch to the version-control flow.
    pub fn new(
        remote: &'a dyn RemoteStateClient,
        digest: &'a dyn DigestService,
        packager: &'a dyn Packager,
        state: ProjectStateStore,
        layout: ProjectLayout,
    ) -> Self {
        Self {
            remote,
            digest,
            packager,
            hosted: None,
            state,
            layout,
            policy: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_repository(mut self, repo: &'a dyn RepositoryFacade, git: GitSettings) -> Self {
        self.hosted = Some(HostedRepo { repo, git });
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Classify every dimension and run the gate. Reads only.
    pub async fn check(&self, target: &SkillTarget, forced: bool) -> Result<SyncReport, DeployError> {
        let markers = self
            .state
            .markers(&target.profile, &target.skill_id)
            .map_err(DeployError::State)?;
        let package_exists = self.layout.package_dir.is_dir();

        let (local, package, code) = tokio::join!(
            self.classify_local(markers.as_ref(), package_exists),
            self.classify_package(target, markers.as_ref(), package_exists),
            self.classify_code(),
        );
        let (local, digest) = local?;
        let code = code?;

        let decision = decide(&local, &package, code.as_ref(), forced);
        debug!(
            skill_id = %target.skill_id,
            profile = %target.profile,
            ?local,
            ?package,
            ?code,
            ?decision,
            "sync state classified"
        );

        Ok(SyncReport {
            local,
            package,
            code,
            decision,
            markers,
            digest,
        })
    }

    /// Run one deploy attempt.
    pub async fn deploy(
        &self,
        target: &SkillTarget,
        forced: bool,
    ) -> Result<DeployOutcome, DeployError> {
        let report = self.check(target, forced).await?;
        let mechanism = match &report.decision {
            DeployDecision::Reject { reason } => {
                info!(skill_id = %target.skill_id, profile = %target.profile, %reason, "deploy rejected");
                return Ok(DeployOutcome::Rejected {
                    reason: reason.clone(),
                    report,
                });
            }
            DeployDecision::Proceed { mechanism } => *mechanism,
        };

        let previous = report
            .markers
            .clone()
            .unwrap_or_else(|| VersionMarkers::new(&target.skill_id));

        info!(skill_id = %target.skill_id, profile = %target.profile, %mechanism, "deploying");
        let (snapshot, digest) = match mechanism {
            DeployMechanism::Push => {
                // The gate only picks a push when a code check ran, which
                // needs a repository.
                let hosted = self.hosted.as_ref().ok_or(DeployError::NoRepository)?;
                let snapshot = self.push_and_poll(target, hosted).await?;
                (snapshot, previous.last_deploy_digest.clone())
            }
            DeployMechanism::Upload => {
                let (snapshot, digest) = self.upload_and_poll(target, report.digest).await?;
                (snapshot, Some(digest))
            }
        };

        let markers = VersionMarkers {
            skill_id: target.skill_id.clone(),
            remote_etag: self.resolve_etag(target, &snapshot, previous.remote_etag).await,
            last_deploy_digest: digest,
            last_deployed_at: Some(Utc::now()),
        };
        self.state
            .commit(&target.profile, &markers)
            .map_err(DeployError::State)?;
        info!(skill_id = %target.skill_id, profile = %target.profile, %mechanism, "deploy succeeded");

        Ok(DeployOutcome::Deployed {
            mechanism,
            snapshot,
            markers,
        })
    }

    /// Replace the local package with the remote one and record its version.
    pub async fn export(&self, target: &SkillTarget) -> Result<ExportOutcome, DeployError> {
        let previous = self
            .state
            .markers(&target.profile, &target.skill_id)
            .map_err(DeployError::State)?
            .unwrap_or_else(|| VersionMarkers::new(&target.skill_id));

        let job = self
            .remote
            .create_export_job(&target.skill_id, target.stage)
            .await?;
        let snapshot = self.poller().poll(&job, &PollPlan::job()).await?;
        let location = snapshot
            .location
            .as_deref()
            .ok_or(RemoteError::MissingLocation)?;

        let archive = self.remote.download_package(location).await?;
        self.packager
            .unpack(&archive, &self.layout.package_dir)
            .map_err(DeployError::Package)?;
        let digest = self
            .digest
            .hash(&self.layout.package_dir)
            .map_err(DeployError::Package)?;

        let markers = VersionMarkers {
            skill_id: target.skill_id.clone(),
            remote_etag: self
                .resolve_etag(target, &snapshot, previous.remote_etag)
                .await,
            last_deploy_digest: Some(digest),
            last_deployed_at: previous.last_deployed_at,
        };
        self.state
            .commit(&target.profile, &markers)
            .map_err(DeployError::State)?;
        info!(skill_id = %target.skill_id, profile = %target.profile, "export succeeded");

        Ok(ExportOutcome { snapshot, markers })
    }

    fn poller(&self) -> BuildPoller<'_> {
        BuildPoller::new(self.remote, self.policy.clone()).with_cancel_token(self.cancel.clone())
    }

    async fn classify_local(
        &self,
        markers: Option<&VersionMarkers>,
        package_exists: bool,
    ) -> Result<(LocalChangeState, Option<String>), DeployError> {
        if let Some(hosted) = &self.hosted {
            let repo = hosted.repo;
            let branch = repo.current_branch().await?;
            let diff = repo.diff_with_head().await?;
            let staged = repo.diff_index_with_head().await?;
            let ahead = repo.ahead_count().await?.unwrap_or(0);
            let work_tree = repo.work_tree_change_count().await?;
            let state = classify_local_changes(
                branch.as_deref(),
                &hosted.git.deployable_branches,
                &diff,
                &staged,
                ahead,
                work_tree,
            );
            return Ok((state, None));
        }

        // A missing package leaves the verdict to the package classifier.
        if !package_exists {
            return Ok((LocalChangeState::ChangesExist, None));
        }
        let digest = self
            .digest
            .hash(&self.layout.package_dir)
            .map_err(DeployError::Package)?;
        let last = markers.and_then(|m| m.last_deploy_digest.as_deref());
        Ok((classify_local_digest(&digest, last), Some(digest)))
    }

    async fn classify_package(
        &self,
        target: &SkillTarget,
        markers: Option<&VersionMarkers>,
        package_exists: bool,
    ) -> PackageSyncState {
        let local_etag = markers.and_then(|m| m.remote_etag.as_deref());
        if !package_exists || target.stage.is_live() {
            return classify_package_sync(local_etag, Ok(None), package_exists, target.stage);
        }

        match self
            .remote
            .get_package_status(&target.skill_id, target.stage)
            .await
        {
            Ok(status) => classify_package_sync(
                local_etag,
                Ok(status.e_tag.as_deref()),
                package_exists,
                target.stage,
            ),
            Err(err) => {
                warn!(skill_id = %target.skill_id, error = %err, "package status read failed");
                let message = err.to_string();
                classify_package_sync(local_etag, Err(&message), package_exists, target.stage)
            }
        }
    }

    async fn classify_code(&self) -> Result<Option<CodeSyncState>, DeployError> {
        let Some(hosted) = &self.hosted else {
            return Ok(None);
        };
        if !self.layout.code_dir.is_dir() {
            return Ok(Some(classify_code_sync(false, 0, 0, None)));
        }

        let repo = hosted.repo;
        let fetch_error = match repo.current_branch().await? {
            Some(branch) => match repo.fetch(&hosted.git.remote, &branch).await {
                Ok(()) => None,
                Err(err) => {
                    warn!(remote = %hosted.git.remote, %branch, error = %err, "fetch failed");
                    Some(err.to_string())
                }
            },
            None => Some("HEAD is detached".to_string()),
        };
        if let Some(message) = fetch_error {
            return Ok(Some(classify_code_sync(true, 0, 0, Some(&message))));
        }

        let ahead = repo.ahead_count().await?.unwrap_or(0);
        let behind = repo.behind_count().await?.unwrap_or(0);
        Ok(Some(classify_code_sync(true, ahead, behind, None)))
    }

    async fn push_and_poll(
        &self,
        target: &SkillTarget,
        hosted: &HostedRepo<'_>,
    ) -> Result<BuildStatusSnapshot, DeployError> {
        hosted.repo.push().await?;
        let commit_id = hosted
            .repo
            .log(1)
            .await?
            .into_iter()
            .next()
            .map(|c| c.id)
            .ok_or(DeployError::MissingCommit)?;
        debug!(skill_id = %target.skill_id, %commit_id, "pushed");

        let job = JobRef::Hosted {
            skill_id: target.skill_id.clone(),
            stage: target.stage,
        };
        Ok(self.poller().poll(&job, &PollPlan::hosted(commit_id)).await?)
    }

    /// Returns the build snapshot and the digest of what was uploaded.
    async fn upload_and_poll(
        &self,
        target: &SkillTarget,
        digest: Option<String>,
    ) -> Result<(BuildStatusSnapshot, String), DeployError> {
        let package_dir: &Path = &self.layout.package_dir;
        let digest = match digest {
            Some(digest) => digest,
            None => self.digest.hash(package_dir).map_err(DeployError::Package)?,
        };
        let archive = self.packager.pack(package_dir).map_err(DeployError::Package)?;
        debug!(skill_id = %target.skill_id, bytes = archive.len(), %digest, "package packed");

        let job = self
            .remote
            .create_import_job(&target.skill_id, target.stage, archive)
            .await?;
        let snapshot = self.poller().poll(&job, &PollPlan::job()).await?;
        Ok((snapshot, digest))
    }

    /// ETag from the snapshot, else one fresh package status read, else the
    /// previous value.
    async fn resolve_etag(
        &self,
        target: &SkillTarget,
        snapshot: &BuildStatusSnapshot,
        previous: Option<String>,
    ) -> Option<String> {
        if let Some(e_tag) = &snapshot.e_tag {
            return Some(e_tag.clone());
        }
        match self
            .remote
            .get_package_status(&target.skill_id, target.stage)
            .await
        {
            Ok(status) if status.e_tag.is_some() => status.e_tag,
            Ok(_) => previous,
            Err(err) => {
                warn!(skill_id = %target.skill_id, error = %err, "could not refresh package ETag");
                previous
            }
        }
    }
}
