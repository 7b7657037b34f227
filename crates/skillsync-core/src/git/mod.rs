//! Version-control access for the hosted deploy flow.
//!
//! This module provides:
//! - The [`RepositoryFacade`] seam the deploy engine depends on
//! - [`GitRepository`], a libgit2-backed implementation

mod error;
mod facade;
mod repository;

pub use error::RepoError;
pub use facade::{ChangeKind, CommitEntry, DiffEntry, RepoFuture, RepositoryFacade};
pub use repository::GitRepository;
