//! Bounded-retry polling of an asynchronous backend build.
//!
//! One state machine serves every build flavour. A [`PollPlan`] names the
//! sub-statuses to track and, for hosted deploys, the commit the backend
//! must be building before its statuses count.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollerSettings;
use crate::remote::{JobRef, RemoteStateClient};

use super::{BuildStatusSnapshot, PollError, StatusKey, SubStatus};

/// Backoff schedule for the poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of status reads, the first one included.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    /// Cap on a single wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&PollerSettings::default())
    }
}

impl From<&PollerSettings> for RetryPolicy {
    fn from(settings: &PollerSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            backoff_factor: settings.backoff_factor,
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait after the given failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }

    /// Sum of every wait the loop can perform before timing out.
    pub fn total_budget(&self) -> Duration {
        (1..self.max_attempts)
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum()
    }
}

/// Which sub-statuses decide the outcome, and which commit must be observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPlan {
    pub tracked: Vec<StatusKey>,
    pub expected_commit: Option<String>,
}

impl PollPlan {
    /// Hosted deploy: code deployment plus package build for a pushed commit.
    pub fn hosted(commit_id: impl Into<String>) -> Self {
        Self {
            tracked: vec![
                StatusKey::HostedDeployment,
                StatusKey::Manifest,
                StatusKey::InteractionModel,
            ],
            expected_commit: Some(commit_id.into()),
        }
    }

    /// Package-only build: manifest and interaction model.
    ///
    /// Pair it with [`JobRef::Hosted`]; that handle reads the skill's build
    /// status, which is where these two stages are reported. Import and
    /// export handles only carry the single job status.
    pub fn package() -> Self {
        Self {
            tracked: vec![StatusKey::Manifest, StatusKey::InteractionModel],
            expected_commit: None,
        }
    }

    /// Single import/export job.
    pub fn job() -> Self {
        Self {
            tracked: vec![StatusKey::Job],
            expected_commit: None,
        }
    }
}

/// Why a poll cycle did not reach a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    CommitNotObserved {
        expected: String,
        observed: Option<String>,
    },
    InProgress,
}

/// Result of interpreting one snapshot.
#[derive(Debug)]
pub enum PollOutcome {
    Done(BuildStatusSnapshot),
    Retry(RetryReason),
    Failed(PollError),
}

/// Apply the decision table to one snapshot. First matching row wins.
pub fn evaluate(snapshot: BuildStatusSnapshot, plan: &PollPlan) -> PollOutcome {
    if let Some(expected) = &plan.expected_commit
        && snapshot.commit_id.as_deref() != Some(expected.as_str())
    {
        return PollOutcome::Retry(RetryReason::CommitNotObserved {
            expected: expected.clone(),
            observed: snapshot.commit_id.clone(),
        });
    }

    for key in &plan.tracked {
        let report = key.extract(&snapshot);
        if report.status == SubStatus::Failed {
            let message = report
                .errors
                .iter()
                .map(|e| e.trim())
                .filter(|e| !e.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            return PollOutcome::Failed(PollError::Build {
                stage: *key,
                message,
            });
        }
    }

    let statuses: Vec<SubStatus> = plan
        .tracked
        .iter()
        .map(|key| key.extract(&snapshot).status)
        .collect();

    if statuses.iter().all(|s| *s == SubStatus::Absent) {
        return PollOutcome::Failed(PollError::Internal);
    }
    if statuses.iter().all(|s| *s == SubStatus::Succeeded) {
        return PollOutcome::Done(snapshot);
    }
    PollOutcome::Retry(RetryReason::InProgress)
}

/// Drives a [`RemoteStateClient`] until a build reaches a terminal state.
pub struct BuildPoller<'a> {
    client: &'a dyn RemoteStateClient,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl<'a> BuildPoller<'a> {
    pub fn new(client: &'a dyn RemoteStateClient, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Poll `job` until success, failure, cancellation or the retry budget
    /// runs out.
    ///
    /// Transient transport failures count as a retry; any other remote error
    /// ends the loop.
    pub async fn poll(
        &self,
        job: &JobRef,
        plan: &PollPlan,
    ) -> Result<BuildStatusSnapshot, PollError> {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                return Err(PollError::Cancelled);
            }

            match self.client.get_job_status(job).await {
                Ok(snapshot) => match evaluate(snapshot, plan) {
                    PollOutcome::Done(snapshot) => {
                        info!(%job, attempt, "build succeeded");
                        return Ok(snapshot);
                    }
                    PollOutcome::Failed(err) => {
                        warn!(%job, attempt, error = %err, "build failed");
                        return Err(err);
                    }
                    PollOutcome::Retry(reason) => {
                        debug!(%job, attempt, ?reason, "build not finished");
                    }
                },
                Err(err) if err.is_transient() => {
                    debug!(%job, attempt, error = %err, "transient status read failure");
                }
                Err(err) => return Err(err.into()),
            }

            if attempt == max_attempts {
                break;
            }

            let delay = self.policy.delay_for_attempt(attempt);
            debug!(%job, attempt, delay_ms = delay.as_millis() as u64, "retrying");
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!(%job, "poll cancelled");
                    return Err(PollError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        warn!(%job, attempts = max_attempts, "build timed out");
        Err(PollError::TimedOut {
            attempts: max_attempts,
        })
    }
}
