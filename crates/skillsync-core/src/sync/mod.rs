//! Sync state classification and the deploy gate.

mod classify;
mod gate;
mod state;

pub use classify::{
    classify_code_sync, classify_local_changes, classify_local_digest, classify_package_sync,
};
pub use gate::{DeployDecision, DeployMechanism, decide};
pub use state::{CodeSyncState, LocalChangeState, PackageSyncState};
