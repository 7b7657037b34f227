//! Deployment supervision and the persisted version markers.

mod error;
pub mod markers;
mod supervisor;

pub use error::DeployError;
pub use markers::{ProjectState, ProjectStateStore, VersionMarkers};
pub use supervisor::{DeployOutcome, DeploymentSupervisor, ExportOutcome, ProjectLayout, SyncReport};
