//! Version-control capability needed by the hosted deploy flow.
//!
//! `RepositoryFacade` keeps the deploy engine decoupled from git so the
//! supervisor can be driven by in-memory fakes in tests.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RepoError;

pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepoError>> + Send + 'a>>;

/// Kind of change recorded by a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    TypeChange,
    Other,
}

/// One path changed by a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub path: String,
    pub kind: ChangeKind,
}

impl DiffEntry {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// One commit from the repository log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub id: String,
    pub summary: String,
    pub author: String,
    pub time: DateTime<Utc>,
}

/// Abstract repository used by the deploy engine.
///
/// Counters are relative to the current branch's upstream and are `None`
/// when the branch has no upstream.
pub trait RepositoryFacade: Send + Sync {
    /// Unstaged changes to tracked files (working tree against index).
    fn diff_with_head(&self) -> RepoFuture<'_, Vec<DiffEntry>>;

    /// Staged changes (index against HEAD).
    fn diff_index_with_head(&self) -> RepoFuture<'_, Vec<DiffEntry>>;

    /// Name of the checked-out branch, `None` when HEAD is detached.
    fn current_branch(&self) -> RepoFuture<'_, Option<String>>;

    fn ahead_count(&self) -> RepoFuture<'_, Option<usize>>;

    fn behind_count(&self) -> RepoFuture<'_, Option<usize>>;

    /// Number of working tree entries that differ from the index,
    /// untracked files included.
    fn work_tree_change_count(&self) -> RepoFuture<'_, usize>;

    fn fetch<'a>(&'a self, remote: &'a str, branch: &'a str) -> RepoFuture<'a, ()>;

    /// Push the current branch to its upstream.
    fn push(&self) -> RepoFuture<'_, ()>;

    /// Most recent commits reachable from HEAD, newest first.
    fn log(&self, max_entries: usize) -> RepoFuture<'_, Vec<CommitEntry>>;
}
