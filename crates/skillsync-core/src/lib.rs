//! skillsync Core Library
//!
//! Decides whether a skill deploy is safe, drives the remote build to a
//! terminal state and records what was deployed.

pub mod build;
pub mod config;
pub mod deploy;
pub mod fs;
pub mod git;
pub mod remote;
pub mod sync;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{Settings, SettingsStore};

    // Shared types
    pub use crate::types::{SkillTarget, Stage};

    // Classification and gate
    pub use crate::sync::{
        CodeSyncState, DeployDecision, DeployMechanism, LocalChangeState, PackageSyncState,
    };

    // Build polling
    pub use crate::build::{BuildPoller, BuildStatusSnapshot, PollError, PollPlan, RetryPolicy};

    // Collaborators
    pub use crate::fs::{DigestService, Packager, TreeDigest, ZipPackager};
    pub use crate::git::{GitRepository, RepositoryFacade};
    pub use crate::remote::{HttpRemoteClient, RemoteStateClient};

    // Deploy
    pub use crate::deploy::{
        DeployError, DeployOutcome, DeploymentSupervisor, ProjectLayout, ProjectStateStore,
        SyncReport, VersionMarkers,
    };
}
