//! Per-poll view of the backend's asynchronous build pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of one build stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubStatus {
    /// The backend has not reported this stage.
    #[default]
    Absent,
    InProgress,
    Succeeded,
    Failed,
}

/// One sub-status plus whatever error messages the backend attached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubStatusReport {
    pub status: SubStatus,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl SubStatusReport {
    pub fn new(status: SubStatus) -> Self {
        Self {
            status,
            errors: Vec::new(),
        }
    }

    pub fn failed<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status: SubStatus::Failed,
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    /// Combine several reports of the same stage (e.g. one per locale).
    ///
    /// Any failure wins, then any stage still running, then success.
    /// An empty input is `Absent`.
    pub fn merge<'a, I>(reports: I) -> Self
    where
        I: IntoIterator<Item = &'a SubStatusReport>,
    {
        let reports: Vec<_> = reports
            .into_iter()
            .filter(|r| r.status != SubStatus::Absent)
            .collect();
        if reports.is_empty() {
            return Self::default();
        }

        let status = if reports.iter().any(|r| r.status == SubStatus::Failed) {
            SubStatus::Failed
        } else if reports.iter().any(|r| r.status == SubStatus::InProgress) {
            SubStatus::InProgress
        } else {
            SubStatus::Succeeded
        };
        let errors = reports
            .iter()
            .flat_map(|r| r.errors.iter().cloned())
            .collect();
        Self { status, errors }
    }
}

/// Transient status payload for one poll cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildStatusSnapshot {
    pub manifest: SubStatusReport,
    pub interaction_model: SubStatusReport,
    /// Hosted code deployment (version-control flow only).
    pub hosted_deployment: SubStatusReport,
    /// Overall import/export job status, with per-resource errors folded in.
    pub job: SubStatusReport,
    /// Commit the backend is building, when it reports one.
    pub commit_id: Option<String>,
    /// Package ETag after the operation, when reported.
    pub e_tag: Option<String>,
    /// Download location of an exported package.
    pub location: Option<String>,
}

/// Names one sub-status of a [`BuildStatusSnapshot`] and knows how to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKey {
    Manifest,
    InteractionModel,
    HostedDeployment,
    Job,
}

impl StatusKey {
    pub fn extract<'a>(&self, snapshot: &'a BuildStatusSnapshot) -> &'a SubStatusReport {
        match self {
            StatusKey::Manifest => &snapshot.manifest,
            StatusKey::InteractionModel => &snapshot.interaction_model,
            StatusKey::HostedDeployment => &snapshot.hosted_deployment,
            StatusKey::Job => &snapshot.job,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKey::Manifest => "manifest",
            StatusKey::InteractionModel => "interaction model",
            StatusKey::HostedDeployment => "hosted skill deployment",
            StatusKey::Job => "package job",
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
