//! Asynchronous build status: snapshots and the retry poller.

mod error;
pub mod poller;
mod snapshot;

pub use error::PollError;
pub use poller::{BuildPoller, PollOutcome, PollPlan, RetryPolicy, RetryReason, evaluate};
pub use snapshot::{BuildStatusSnapshot, StatusKey, SubStatus, SubStatusReport};
