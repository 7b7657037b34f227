#![allow(dead_code)]

pub mod git;

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;

use skillsync_core::build::{BuildStatusSnapshot, RetryPolicy, SubStatus, SubStatusReport};
use skillsync_core::git::{CommitEntry, DiffEntry, RepoError, RepoFuture, RepositoryFacade};
use skillsync_core::remote::{
    CertificationPage, JobRef, PackageStatus, RemoteError, RemoteFuture, RemoteStateClient,
};
use skillsync_core::types::Stage;

/// Fast schedule so tests that do sleep stay quick.
pub fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: std::time::Duration::from_millis(1),
        backoff_factor: 1.0,
        max_delay: std::time::Duration::from_millis(1),
    }
}

pub fn server_error() -> RemoteError {
    RemoteError::Status {
        status: 500,
        body: "internal".to_string(),
    }
}

pub fn job(status: SubStatus) -> BuildStatusSnapshot {
    BuildStatusSnapshot {
        job: SubStatusReport::new(status),
        ..Default::default()
    }
}

pub fn job_succeeded(e_tag: Option<&str>) -> BuildStatusSnapshot {
    BuildStatusSnapshot {
        job: SubStatusReport::new(SubStatus::Succeeded),
        e_tag: e_tag.map(str::to_string),
        ..Default::default()
    }
}

pub fn hosted(status: SubStatus, commit: Option<&str>) -> BuildStatusSnapshot {
    BuildStatusSnapshot {
        manifest: SubStatusReport::new(status),
        interaction_model: SubStatusReport::new(status),
        hosted_deployment: SubStatusReport::new(status),
        commit_id: commit.map(str::to_string),
        ..Default::default()
    }
}

/// Scripted in-memory remote service.
///
/// Job statuses are served from a queue; once it is empty `fallback` is
/// returned forever.
pub struct MockRemote {
    pub package: Mutex<Result<PackageStatus, String>>,
    pub statuses: Mutex<VecDeque<Result<BuildStatusSnapshot, RemoteError>>>,
    pub fallback: Mutex<BuildStatusSnapshot>,
    pub polled: Mutex<Vec<JobRef>>,
    pub package_calls: AtomicUsize,
    pub imports: Mutex<Vec<(String, Stage, Vec<u8>)>>,
    pub export_calls: AtomicUsize,
    pub download: Mutex<Result<Vec<u8>, String>>,
    pub downloads: Mutex<Vec<String>>,
    pub certification_pages: Mutex<VecDeque<CertificationPage>>,
    pub certification_tokens: Mutex<Vec<Option<String>>>,
    /// Cancelled on the first status read.
    pub cancel_on_status: Mutex<Option<CancellationToken>>,
}

impl Default for MockRemote {
    fn default() -> Self {
        Self {
            package: Mutex::new(Ok(PackageStatus::default())),
            statuses: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(job(SubStatus::InProgress)),
            polled: Mutex::new(Vec::new()),
            package_calls: AtomicUsize::new(0),
            imports: Mutex::new(Vec::new()),
            export_calls: AtomicUsize::new(0),
            download: Mutex::new(Ok(Vec::new())),
            downloads: Mutex::new(Vec::new()),
            certification_pages: Mutex::new(VecDeque::new()),
            certification_tokens: Mutex::new(Vec::new()),
            cancel_on_status: Mutex::new(None),
        }
    }
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_etag(self, e_tag: &str) -> Self {
        *self.package.lock().unwrap() = Ok(PackageStatus {
            e_tag: Some(e_tag.to_string()),
            location: None,
        });
        self
    }

    pub fn with_package_error(self, message: &str) -> Self {
        *self.package.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn with_statuses<I>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = BuildStatusSnapshot>,
    {
        self.statuses
            .lock()
            .unwrap()
            .extend(statuses.into_iter().map(Ok));
        self
    }

    pub fn push_status_error(&self, err: RemoteError) {
        self.statuses.lock().unwrap().push_back(Err(err));
    }

    pub fn with_fallback(self, snapshot: BuildStatusSnapshot) -> Self {
        *self.fallback.lock().unwrap() = snapshot;
        self
    }

    pub fn with_download(self, archive: Vec<u8>) -> Self {
        *self.download.lock().unwrap() = Ok(archive);
        self
    }

    pub fn status_calls(&self) -> usize {
        self.polled.lock().unwrap().len()
    }

    pub fn import_calls(&self) -> usize {
        self.imports.lock().unwrap().len()
    }
}

impl RemoteStateClient for MockRemote {
    fn get_package_status<'a>(
        &'a self,
        _skill_id: &'a str,
        _stage: Stage,
    ) -> RemoteFuture<'a, PackageStatus> {
        self.package_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .package
            .lock()
            .unwrap()
            .clone()
            .map_err(RemoteError::Other);
        Box::pin(async move { result })
    }

    fn create_export_job<'a>(&'a self, _skill_id: &'a str, _stage: Stage) -> RemoteFuture<'a, JobRef> {
        let n = self.export_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            Ok(JobRef::Export {
                id: format!("export-{}", n + 1),
            })
        })
    }

    fn create_import_job<'a>(
        &'a self,
        skill_id: &'a str,
        stage: Stage,
        archive: Vec<u8>,
    ) -> RemoteFuture<'a, JobRef> {
        let mut imports = self.imports.lock().unwrap();
        imports.push((skill_id.to_string(), stage, archive));
        let id = format!("import-{}", imports.len());
        Box::pin(async move { Ok(JobRef::Import { id }) })
    }

    fn get_job_status<'a>(&'a self, job: &'a JobRef) -> RemoteFuture<'a, BuildStatusSnapshot> {
        self.polled.lock().unwrap().push(job.clone());
        if let Some(token) = self.cancel_on_status.lock().unwrap().take() {
            token.cancel();
        }
        let result = match self.statuses.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(self.fallback.lock().unwrap().clone()),
        };
        Box::pin(async move { result })
    }

    fn get_certifications<'a>(
        &'a self,
        _skill_id: &'a str,
        next_token: Option<&'a str>,
    ) -> RemoteFuture<'a, CertificationPage> {
        self.certification_tokens
            .lock()
            .unwrap()
            .push(next_token.map(str::to_string));
        let page = self
            .certification_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        Box::pin(async move { Ok(page) })
    }

    fn download_package<'a>(&'a self, location: &'a str) -> RemoteFuture<'a, Vec<u8>> {
        self.downloads.lock().unwrap().push(location.to_string());
        let result = self.download.lock().unwrap().clone().map_err(RemoteError::Other);
        Box::pin(async move { result })
    }
}

/// In-memory repository with fixed answers.
pub struct FakeRepo {
    pub branch: Option<String>,
    pub diff: Vec<DiffEntry>,
    pub staged: Vec<DiffEntry>,
    pub ahead: Option<usize>,
    pub behind: Option<usize>,
    pub work_tree: usize,
    pub fetch_error: Option<String>,
    pub push_error: Option<String>,
    pub head: Option<String>,
    pub pushes: AtomicUsize,
    pub fetches: Mutex<Vec<(String, String)>>,
}

impl Default for FakeRepo {
    fn default() -> Self {
        Self {
            branch: Some("dev".to_string()),
            diff: Vec::new(),
            staged: Vec::new(),
            ahead: Some(0),
            behind: Some(0),
            work_tree: 0,
            fetch_error: None,
            push_error: None,
            head: Some("c0ffee".to_string()),
            pushes: AtomicUsize::new(0),
            fetches: Mutex::new(Vec::new()),
        }
    }
}

impl FakeRepo {
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }
}

fn command_error(cmd: &str, stderr: &str) -> RepoError {
    RepoError::Command {
        args: vec![cmd.to_string()],
        stderr: stderr.to_string(),
    }
}

impl RepositoryFacade for FakeRepo {
    fn diff_with_head(&self) -> RepoFuture<'_, Vec<DiffEntry>> {
        let diff = self.diff.clone();
        Box::pin(async move { Ok(diff) })
    }

    fn diff_index_with_head(&self) -> RepoFuture<'_, Vec<DiffEntry>> {
        let staged = self.staged.clone();
        Box::pin(async move { Ok(staged) })
    }

    fn current_branch(&self) -> RepoFuture<'_, Option<String>> {
        let branch = self.branch.clone();
        Box::pin(async move { Ok(branch) })
    }

    fn ahead_count(&self) -> RepoFuture<'_, Option<usize>> {
        let ahead = self.ahead;
        Box::pin(async move { Ok(ahead) })
    }

    fn behind_count(&self) -> RepoFuture<'_, Option<usize>> {
        let behind = self.behind;
        Box::pin(async move { Ok(behind) })
    }

    fn work_tree_change_count(&self) -> RepoFuture<'_, usize> {
        let count = self.work_tree;
        Box::pin(async move { Ok(count) })
    }

    fn fetch<'a>(&'a self, remote: &'a str, branch: &'a str) -> RepoFuture<'a, ()> {
        self.fetches
            .lock()
            .unwrap()
            .push((remote.to_string(), branch.to_string()));
        let result = match &self.fetch_error {
            Some(stderr) => Err(command_error("fetch", stderr)),
            None => Ok(()),
        };
        Box::pin(async move { result })
    }

    fn push(&self) -> RepoFuture<'_, ()> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        let result = match &self.push_error {
            Some(stderr) => Err(command_error("push", stderr)),
            None => Ok(()),
        };
        Box::pin(async move { result })
    }

    fn log(&self, max_entries: usize) -> RepoFuture<'_, Vec<CommitEntry>> {
        let entries: Vec<CommitEntry> = self
            .head
            .iter()
            .take(max_entries)
            .map(|id| CommitEntry {
                id: id.clone(),
                summary: "update skill".to_string(),
                author: "Test".to_string(),
                time: chrono::Utc::now(),
            })
            .collect();
        Box::pin(async move { Ok(entries) })
    }
}
