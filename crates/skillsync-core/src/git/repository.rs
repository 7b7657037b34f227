//! git2-backed repository facade.
//!
//! Read-only queries go through libgit2. Network operations (fetch, push)
//! shell out to the `git` binary so the user's credential helpers apply.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{BranchType, Delta, DiffOptions, ErrorCode, Repository, Status, StatusOptions};
use tracing::debug;

use super::facade::{ChangeKind, CommitEntry, DiffEntry, RepoFuture, RepositoryFacade};
use super::RepoError;

/// Repository facade over a local git work tree.
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    /// Open the repository containing `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let path = path.into();
        let repo = Repository::discover(&path)?;
        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.clone());
        Ok(Self { path: root })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a blocking libgit2 query on the blocking pool.
    fn query<T, F>(&self, f: F) -> RepoFuture<'_, T>
    where
        T: Send + 'static,
        F: FnOnce(&Repository) -> Result<T, RepoError> + Send + 'static,
    {
        let path = self.path.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let repo = Repository::open(&path)?;
                f(&repo)
            })
            .await?
        })
    }

    fn run_git_async(&self, args: Vec<String>) -> RepoFuture<'_, ()> {
        let path = self.path.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || run_git(&path, &args)).await?
        })
    }
}

impl RepositoryFacade for GitRepository {
    fn diff_with_head(&self) -> RepoFuture<'_, Vec<DiffEntry>> {
        self.query(|repo| {
            let mut opts = DiffOptions::new();
            let diff = repo.diff_index_to_workdir(None, Some(&mut opts))?;
            Ok(collect_deltas(&diff))
        })
    }

    fn diff_index_with_head(&self) -> RepoFuture<'_, Vec<DiffEntry>> {
        self.query(|repo| {
            let head_tree = match repo.head() {
                Ok(head) => Some(head.peel_to_tree()?),
                Err(e) if e.code() == ErrorCode::UnbornBranch => None,
                Err(e) => return Err(e.into()),
            };
            let mut opts = DiffOptions::new();
            let diff = repo.diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))?;
            Ok(collect_deltas(&diff))
        })
    }

    fn current_branch(&self) -> RepoFuture<'_, Option<String>> {
        self.query(|repo| current_branch_name(repo).map_err(RepoError::from))
    }

    fn ahead_count(&self) -> RepoFuture<'_, Option<usize>> {
        self.query(|repo| Ok(ahead_behind(repo)?.map(|(ahead, _)| ahead)))
    }

    fn behind_count(&self) -> RepoFuture<'_, Option<usize>> {
        self.query(|repo| Ok(ahead_behind(repo)?.map(|(_, behind)| behind)))
    }

    fn work_tree_change_count(&self) -> RepoFuture<'_, usize> {
        self.query(|repo| {
            let mut opts = StatusOptions::new();
            opts.include_untracked(true)
                .recurse_untracked_dirs(true)
                .include_ignored(false);
            let statuses = repo.statuses(Some(&mut opts))?;
            let work_tree = Status::WT_NEW
                | Status::WT_MODIFIED
                | Status::WT_DELETED
                | Status::WT_RENAMED
                | Status::WT_TYPECHANGE;
            Ok(statuses
                .iter()
                .filter(|entry| entry.status().intersects(work_tree))
                .count())
        })
    }

    fn fetch<'a>(&'a self, remote: &'a str, branch: &'a str) -> RepoFuture<'a, ()> {
        debug!(remote, branch, "fetching");
        self.run_git_async(vec!["fetch".into(), remote.into(), branch.into()])
    }

    fn push(&self) -> RepoFuture<'_, ()> {
        debug!(path = %self.path.display(), "pushing");
        self.run_git_async(vec!["push".into()])
    }

    fn log(&self, max_entries: usize) -> RepoFuture<'_, Vec<CommitEntry>> {
        self.query(move |repo| {
            let mut revwalk = repo.revwalk()?;
            match revwalk.push_head() {
                Ok(()) => {}
                Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            }
            revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;

            let mut entries = Vec::new();
            for oid in revwalk.take(max_entries) {
                let commit = repo.find_commit(oid?)?;
                let time = chrono::DateTime::from_timestamp(commit.time().seconds(), 0)
                    .unwrap_or_default();
                entries.push(CommitEntry {
                    id: commit.id().to_string(),
                    summary: commit.summary().unwrap_or_default().to_string(),
                    author: commit.author().name().unwrap_or_default().to_string(),
                    time,
                });
            }
            Ok(entries)
        })
    }
}

fn collect_deltas(diff: &git2::Diff<'_>) -> Vec<DiffEntry> {
    diff.deltas()
        .map(|delta| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            let kind = match delta.status() {
                Delta::Added | Delta::Untracked => ChangeKind::Added,
                Delta::Modified => ChangeKind::Modified,
                Delta::Deleted => ChangeKind::Deleted,
                Delta::Renamed => ChangeKind::Renamed,
                Delta::Typechange => ChangeKind::TypeChange,
                _ => ChangeKind::Other,
            };
            DiffEntry { path, kind }
        })
        .collect()
}

fn current_branch_name(repo: &Repository) -> Result<Option<String>, git2::Error> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
        Ok(_) => Ok(None),
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            // No commits yet: HEAD still names the branch it will create.
            let head = repo.find_reference("HEAD")?;
            Ok(head
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .map(str::to_string))
        }
        Err(e) => Err(e),
    }
}

/// Ahead/behind counts of the current branch against its upstream.
fn ahead_behind(repo: &Repository) -> Result<Option<(usize, usize)>, RepoError> {
    let Some(name) = current_branch_name(repo)? else {
        return Ok(None);
    };
    let branch = match repo.find_branch(&name, BranchType::Local) {
        Ok(branch) => branch,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let upstream = match branch.upstream() {
        Ok(upstream) => upstream,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let local = branch.get().target().ok_or(RepoError::NoHead)?;
    let Some(remote) = upstream.get().target() else {
        return Ok(None);
    };
    Ok(Some(repo.graph_ahead_behind(local, remote)?))
}

/// Variables that would point git at a different repository than `cwd`.
const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

/// Run a git command in `cwd`.
fn run_git(cwd: &Path, args: &[String]) -> Result<(), RepoError> {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    let output = cmd.args(args).current_dir(cwd).output()?;
    if !output.status.success() {
        return Err(RepoError::Command {
            args: args.to_vec(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
